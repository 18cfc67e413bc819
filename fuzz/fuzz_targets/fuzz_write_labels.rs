#![no_main]
use libfuzzer_sys::fuzz_target;
use upsbridge::classifier::DeviceFamily;
use upsbridge::session::{DeviceProfile, Session};
use upsbridge::store::MemoryStore;
use upsbridge::transport::SimulatedDevice;
use upsbridge::{Engine, Registry};

fuzz_target!(|data: &[u8]| {
    // First line picks the variable, the rest is the label
    let text = String::from_utf8_lossy(data);
    let (name, label) = text.split_once('\n').unwrap_or((text.as_ref(), ""));

    let session = Session::new(DeviceProfile::new(DeviceFamily::Eaton9E, "fuzz"));
    let mut engine = Engine::new(
        Registry::builtin(),
        session,
        SimulatedDevice::new(),
        MemoryStore::new(),
    );
    let _ = engine.set_variable(name, label);
    let _ = engine.instant_command(label);
});
