//! Built-in Eaton/MGE HID mapping table
//!
//! Order matters. Chains flagged `precedes` feed state (ABM, transfer
//! inputs) that later chains and status entries derive from, and status
//! entries are evaluated in the order listed here.

use super::MappingEntry;
use crate::convert::catalog::{
    beeper, bypass_switch_off, bypass_switch_on, charger_type, enable_disable,
    inverted_status_bit, on_off, status_bit, ups_type, yes_no,
};
use crate::convert::eaton::{
    BatteryVoltage, ClockPart, ConverterOnline, CountryCapture, DeviceClock, KelvinToCelsius,
    NominalBatteryVoltage, NominalOutputVoltage, PegasusThreshold, PegasusYesNo,
    RealPowerEstimate,
};
use crate::convert::{Converter, Formatter};
use crate::charger::{
    AbmChargeIndicator, AbmEnabled, AbmPathProbe, AbmStatus, ActivePath, LegacyChargeIndicator,
};
use crate::transfer::EcoModeReport;
use crate::transfer::sequence::SequenceDirection;

/// Startup delay published before the device is ever asked
pub const DEFAULT_ONDELAY: &str = "30";
/// Shutdown delay published before the device is ever asked
pub const DEFAULT_OFFDELAY: &str = "20";

const CHARGER_MODE: &str = "UPS.BatterySystem.Charger.Mode";
const CHARGER_STATUS: &str = "UPS.BatterySystem.Charger.Status";
const ECO_SWITCHABLE_PATH: &str = "UPS.PowerConverter.Input.[5].Switchable";

fn v(name: &str, path: &str) -> MappingEntry {
    MappingEntry::variable(name, path)
}

fn abm_entries() -> Vec<MappingEntry> {
    vec![
        v("battery.charger.abm.status", "UPS.BatterySystem.Charger.ABMEnable")
            .convert(Converter::dynamic(AbmEnabled))
            .precedes(),
        v("battery.charger.mode.status", CHARGER_MODE)
            .convert(Converter::dynamic(AbmPathProbe(ActivePath::PathA)))
            .precedes(),
        v("battery.charger.type.status", CHARGER_STATUS)
            .convert(Converter::dynamic(AbmPathProbe(ActivePath::PathB)))
            .precedes(),
        v("battery.charger.status", CHARGER_MODE)
            .convert(Converter::dynamic(AbmStatus(ActivePath::PathA)))
            .precedes(),
        v("battery.charger.status", CHARGER_STATUS)
            .convert(Converter::dynamic(AbmStatus(ActivePath::PathB)))
            .precedes(),
    ]
}

fn battery_entries() -> Vec<MappingEntry> {
    vec![
        v("battery.charge", "UPS.PowerSummary.RemainingCapacity"),
        v("battery.charge.low", "UPS.PowerSummary.RemainingCapacityLimitSetting")
            .writable()
            .semi_static(),
        v("battery.charge.low", "UPS.PowerSummary.RemainingCapacityLimit").static_value(),
        v("battery.charge.restart", "UPS.PowerSummary.RestartLevel")
            .writable()
            .semi_static(),
        v("battery.capacity", "UPS.BatterySystem.Battery.DesignCapacity")
            .format(Formatter::divided(3600.0, 2))
            .static_value(),
        v("battery.runtime", "UPS.PowerSummary.RunTimeToEmpty"),
        v("battery.runtime.low", "UPS.PowerSummary.RemainingTimeLimit").writable(),
        v("battery.temperature", "UPS.BatterySystem.Battery.Temperature")
            .convert(Converter::dynamic(KelvinToCelsius)),
        v("battery.voltage", "UPS.BatterySystem.Voltage").format(Formatter::fixed(1)),
        v("battery.voltage", "UPS.PowerSummary.Voltage")
            .convert(Converter::dynamic(BatteryVoltage)),
        v("battery.voltage.nominal", "UPS.BatterySystem.ConfigVoltage").static_value(),
        v("battery.voltage.nominal", "UPS.PowerSummary.ConfigVoltage")
            .convert(Converter::dynamic(NominalBatteryVoltage))
            .static_value(),
        v("battery.protection", "UPS.BatterySystem.Battery.DeepDischargeProtection")
            .convert(yes_no())
            .writable()
            .semi_static(),
        v("battery.energysave", "UPS.PowerConverter.Input.[3].EnergySaving")
            .convert(yes_no())
            .writable()
            .semi_static(),
        v("battery.charger.type", "UPS.BatterySystem.Charger.ChargerType").convert(charger_type()),
    ]
}

fn ups_entries() -> Vec<MappingEntry> {
    vec![
        v("ups.load", "UPS.PowerSummary.PercentLoad"),
        v("ups.load.high", "UPS.Flow.[4].ConfigPercentLoad")
            .writable()
            .semi_static(),
        v("ups.delay.start", "UPS.PowerSummary.DelayBeforeStartup")
            .absent(DEFAULT_ONDELAY)
            .writable(),
        v("ups.delay.shutdown", "UPS.PowerSummary.DelayBeforeShutdown")
            .absent(DEFAULT_OFFDELAY)
            .writable(),
        v("ups.timer.start", "UPS.PowerSummary.DelayBeforeStartup"),
        v("ups.timer.shutdown", "UPS.PowerSummary.DelayBeforeShutdown"),
        v("ups.timer.reboot", "UPS.PowerSummary.DelayBeforeReboot"),
        v("ups.test.interval", "UPS.BatterySystem.Battery.TestPeriod")
            .writable()
            .semi_static(),
        v("ups.beeper.status", "UPS.BatterySystem.Battery.AudibleAlarmControl")
            .convert(beeper())
            .semi_static(),
        v("ups.beeper.status", "UPS.PowerSummary.AudibleAlarmControl")
            .convert(beeper())
            .semi_static(),
        v("ups.beeper.status", "UPS.AudibleAlarmControl")
            .convert(beeper())
            .semi_static(),
        v("ups.temperature", "UPS.PowerSummary.Temperature")
            .convert(Converter::dynamic(KelvinToCelsius)),
        v("ups.power", "UPS.PowerConverter.Output.ApparentPower"),
        v("ups.power.nominal", "UPS.Flow.[4].ConfigApparentPower").static_value(),
        v("ups.realpower", "UPS.PowerConverter.Output.ActivePower"),
        v("ups.realpower", "UPS.Flow.[4].ConfigApparentPower")
            .convert(Converter::dynamic(RealPowerEstimate)),
        v("ups.realpower.nominal", "UPS.Flow.[4].ConfigActivePower").static_value(),
        v("ups.start.auto", "UPS.PowerConverter.Input.[1].AutomaticRestart")
            .convert(yes_no())
            .writable()
            .semi_static(),
        v("ups.start.battery", "UPS.PowerConverter.Input.[3].StartOnBattery")
            .convert(yes_no())
            .writable()
            .semi_static(),
        v("ups.shutdown", "UPS.PowerSummary.PresentStatus.Switchable")
            .convert(enable_disable())
            .writable()
            .semi_static()
            .enumerated(),
        v("ups.date", "UPS.PowerSummary.Time")
            .convert(Converter::dynamic(DeviceClock(ClockPart::Date)))
            .writable(),
        v("ups.time", "UPS.PowerSummary.Time")
            .convert(Converter::dynamic(DeviceClock(ClockPart::Time)))
            .writable(),
        v("ups.type", "UPS.PowerConverter.ConverterType")
            .convert(ups_type())
            .static_value(),
    ]
}

fn status_entries() -> Vec<MappingEntry> {
    let s = MappingEntry::status;
    vec![
        s("UPS.PowerSummary.PresentStatus.ACPresent", status_bit("online")),
        s(
            "UPS.PowerConverter.Input.[3].PresentStatus.Used",
            inverted_status_bit("online"),
        ),
        s(
            "UPS.PowerSummary.PresentStatus.Discharging",
            Converter::dynamic(LegacyChargeIndicator { token: "dischrg" }),
        ),
        s(
            "UPS.PowerSummary.PresentStatus.Charging",
            Converter::dynamic(LegacyChargeIndicator { token: "chrg" }),
        ),
        s(
            CHARGER_MODE,
            Converter::dynamic(AbmChargeIndicator(ActivePath::PathA)),
        ),
        s(
            CHARGER_STATUS,
            Converter::dynamic(AbmChargeIndicator(ActivePath::PathB)),
        ),
        s(
            "UPS.PowerSummary.PresentStatus.BelowRemainingCapacityLimit",
            status_bit("lowbatt"),
        ),
        s(
            "UPS.PowerConverter.Output.Overload.[1].PresentStatus.OverThreshold",
            status_bit("overload"),
        ),
        s(
            "UPS.PowerConverter.Output.Overload.[2].PresentStatus.OverThreshold",
            status_bit("overload"),
        ),
        s("UPS.PowerSummary.PresentStatus.Overload", status_bit("overload")),
        s(
            "UPS.PowerSummary.PresentStatus.NeedReplacement",
            status_bit("replacebatt"),
        ),
        s("UPS.PowerConverter.Input.[1].PresentStatus.Buck", status_bit("trim")),
        s("UPS.PowerConverter.Input.[1].PresentStatus.Boost", status_bit("boost")),
        s("UPS.PowerSummary.PresentStatus.Good", inverted_status_bit("off")),
        // must follow PresentStatus.Good
        s(
            "UPS.PowerConverter.Input.[1].PresentStatus.Used",
            Converter::dynamic(ConverterOnline),
        ),
        s(
            "UPS.PowerConverter.Input.[2].PresentStatus.Used",
            status_bit("bypassauto"),
        ),
        s(
            "UPS.PowerConverter.Input.[4].PresentStatus.Used",
            status_bit("bypassman"),
        ),
        s(
            "UPS.PowerConverter.Input.[5].PresentStatus.Used",
            status_bit("ecomode"),
        ),
        s("UPS.PowerSummary.PresentStatus.FanFailure", status_bit("fanfail")),
        s(
            "UPS.BatterySystem.Battery.PresentStatus.Present",
            inverted_status_bit("nobattery"),
        ),
        s(
            "UPS.PowerSummary.PresentStatus.ShutdownImminent",
            status_bit("shutdownimm"),
        ),
    ]
}

fn transfer_entries() -> Vec<MappingEntry> {
    vec![
        v("input.transfer.eco.low", "UPS.PowerConverter.Output.LowVoltageEcoTransfer")
            .writable()
            .semi_static()
            .precedes(),
        v("input.transfer.bypass.low", "UPS.PowerConverter.Output.LowVoltageBypassTransfer")
            .writable()
            .semi_static()
            .precedes(),
        v("input.transfer.eco.high", "UPS.PowerConverter.Output.HighVoltageEcoTransfer")
            .writable()
            .semi_static()
            .precedes(),
        v("input.transfer.bypass.high", "UPS.PowerConverter.Output.HighVoltageBypassTransfer")
            .writable()
            .semi_static()
            .precedes(),
        v(
            "input.transfer.frequency.bypass.range",
            "UPS.PowerConverter.Output.FrequencyRangeBypassTransfer",
        )
        .writable()
        .semi_static()
        .precedes(),
        v(
            "input.transfer.frequency.eco.range",
            "UPS.PowerConverter.Output.FrequencyRangeEcoTransfer",
        )
        .writable()
        .semi_static()
        .precedes(),
        v("input.bypass.voltage", "UPS.PowerConverter.Input.[2].Voltage")
            .format(Formatter::fixed(1))
            .precedes(),
        v("input.bypass.frequency", "UPS.PowerConverter.Input.[2].Frequency")
            .format(Formatter::fixed(1))
            .precedes(),
        v("output.voltage.nominal", "UPS.Flow.[4].ConfigVoltage")
            .convert(Converter::dynamic(NominalOutputVoltage))
            .writable()
            .semi_static()
            .precedes(),
        v("output.frequency.nominal", "UPS.Flow.[4].ConfigFrequency")
            .static_value()
            .precedes(),
        v("input.bypass.switch.on", "UPS.PowerConverter.Input.[2].SwitchOnControl")
            .convert(bypass_switch_on())
            .writable(),
        v("input.bypass.switch.off", "UPS.PowerConverter.Input.[2].SwitchOffControl")
            .convert(bypass_switch_off())
            .writable(),
        v("input.bypass.switchable", "UPS.PowerConverter.Input.[2].Switchable")
            .convert(enable_disable())
            .writable()
            .semi_static(),
        v("input.eco.switchable", ECO_SWITCHABLE_PATH)
            .convert(Converter::dynamic(EcoModeReport))
            .writable(),
    ]
}

fn electrical_entries() -> Vec<MappingEntry> {
    vec![
        v("device.country", "UPS.PowerSummary.Country")
            .convert(Converter::dynamic(CountryCapture))
            .static_value()
            .precedes(),
        v("input.voltage", "UPS.PowerConverter.Input.[1].Voltage").format(Formatter::fixed(1)),
        v("input.voltage.nominal", "UPS.Flow.[1].ConfigVoltage").static_value(),
        v("input.current", "UPS.PowerConverter.Input.[1].Current").format(Formatter::fixed(2)),
        v("input.frequency", "UPS.PowerConverter.Input.[1].Frequency").format(Formatter::fixed(1)),
        v("output.voltage", "UPS.PowerConverter.Output.Voltage").format(Formatter::fixed(1)),
        v("output.current", "UPS.PowerConverter.Output.Current").format(Formatter::fixed(2)),
        v("output.frequency", "UPS.PowerConverter.Output.Frequency").format(Formatter::fixed(1)),
        v("output.powerfactor", "UPS.PowerConverter.Output.PowerFactor")
            .format(Formatter::divided(100.0, 2)),
        v("outlet.power", "UPS.OutletSystem.Outlet.[1].ConfigApparentPower")
            .convert(Converter::dynamic(PegasusThreshold))
            .writable()
            .semi_static(),
        v("outlet.1.status", "UPS.OutletSystem.Outlet.[2].PresentStatus.SwitchOn/Off")
            .convert(on_off()),
        v("outlet.1.ecocontrol", "UPS.OutletSystem.Outlet.[2].ECOControl")
            .convert(Converter::dynamic(PegasusYesNo))
            .writable()
            .semi_static(),
        v("outlet.2.status", "UPS.OutletSystem.Outlet.[3].PresentStatus.SwitchOn/Off")
            .convert(on_off()),
        v("outlet.2.ecocontrol", "UPS.OutletSystem.Outlet.[3].ECOControl")
            .convert(Converter::dynamic(PegasusYesNo))
            .writable()
            .semi_static(),
    ]
}

fn command_entries() -> Vec<MappingEntry> {
    let c = MappingEntry::command;
    vec![
        c("test.battery.start.quick", "UPS.BatterySystem.Battery.Test", "1"),
        c("test.battery.start.deep", "UPS.BatterySystem.Battery.Test", "2"),
        c("test.battery.stop", "UPS.BatterySystem.Battery.Test", "3"),
        c("load.off.delay", "UPS.PowerSummary.DelayBeforeShutdown", DEFAULT_OFFDELAY),
        c("load.on.delay", "UPS.PowerSummary.DelayBeforeStartup", DEFAULT_ONDELAY),
        c("shutdown.stop", "UPS.PowerSummary.DelayBeforeShutdown", "-1"),
        c("shutdown.reboot", "UPS.PowerSummary.DelayBeforeReboot", "10"),
        c("beeper.mute", "UPS.BatterySystem.Battery.AudibleAlarmControl", "3"),
        c("beeper.mute", "UPS.PowerSummary.AudibleAlarmControl", "3"),
        c("beeper.disable", "UPS.BatterySystem.Battery.AudibleAlarmControl", "1"),
        c("beeper.disable", "UPS.PowerSummary.AudibleAlarmControl", "1"),
        c("beeper.disable", "UPS.AudibleAlarmControl", "1"),
        c("beeper.enable", "UPS.BatterySystem.Battery.AudibleAlarmControl", "2"),
        c("beeper.enable", "UPS.PowerSummary.AudibleAlarmControl", "2"),
        c("beeper.enable", "UPS.AudibleAlarmControl", "2"),
        c("outlet.1.load.off", "UPS.OutletSystem.Outlet.[2].DelayBeforeShutdown", "0"),
        c("outlet.1.load.on", "UPS.OutletSystem.Outlet.[2].DelayBeforeStartup", "0"),
        c("outlet.2.load.off", "UPS.OutletSystem.Outlet.[3].DelayBeforeShutdown", "0"),
        c("outlet.2.load.on", "UPS.OutletSystem.Outlet.[3].DelayBeforeStartup", "0"),
        c("experimental.ecomode.start", ECO_SWITCHABLE_PATH, "1"),
        c("experimental.ecomode.stop", ECO_SWITCHABLE_PATH, "0"),
        c("experimental.essmode.start", ECO_SWITCHABLE_PATH, "2"),
        c("experimental.essmode.stop", ECO_SWITCHABLE_PATH, "0"),
        MappingEntry::sequence(
            "experimental.bypass.ecomode.start",
            ECO_SWITCHABLE_PATH,
            SequenceDirection::Enter,
        ),
        MappingEntry::sequence(
            "experimental.bypass.ecomode.stop",
            ECO_SWITCHABLE_PATH,
            SequenceDirection::Exit,
        ),
        c("bypass.start", "UPS.PowerConverter.Input.[2].SwitchOnControl", "1"),
        c("bypass.stop", "UPS.PowerConverter.Input.[2].SwitchOffControl", "1"),
    ]
}

/// Every entry of the built-in table, in evaluation order
pub fn entries() -> Vec<MappingEntry> {
    let mut all = Vec::new();
    all.extend(electrical_entries());
    all.extend(battery_entries());
    all.extend(abm_entries());
    all.extend(ups_entries());
    all.extend(transfer_entries());
    all.extend(status_entries());
    all.extend(command_entries());
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{EntryKind, Registry};

    #[test]
    fn delays_are_absent_with_defaults() {
        let registry = Registry::new(entries());
        let start = registry.variable("ups.delay.start").unwrap();
        assert!(start.is_absent());
        assert_eq!(start.entries[0].formatter.literal_text(), Some(DEFAULT_ONDELAY));
    }

    #[test]
    fn beeper_commands_fall_back_across_paths() {
        let registry = Registry::new(entries());
        assert_eq!(registry.command("beeper.enable").unwrap().entries.len(), 3);
        assert!(matches!(
            registry.command("bypass.start").unwrap().entries[0].kind,
            EntryKind::Command(_)
        ));
    }

    #[test]
    fn converter_online_follows_off() {
        let registry = Registry::new(entries());
        let paths: Vec<&str> = registry
            .status_entries()
            .iter()
            .map(|e| e.path.as_str())
            .collect();
        let good = paths
            .iter()
            .position(|p| *p == "UPS.PowerSummary.PresentStatus.Good")
            .unwrap();
        let converter = paths
            .iter()
            .position(|p| *p == "UPS.PowerConverter.Input.[1].PresentStatus.Used")
            .unwrap();
        assert!(good < converter);
    }
}
