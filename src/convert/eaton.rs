//! Eaton/MGE specific conversions
//!
//! Most of these are gated on the device family or the captured country:
//! a converter that does not apply to the connected model declines, and
//! the fallback chain moves on (or nothing is published).

use super::{ConvertContext, DynamicConversion, InvalidValue};
use crate::classifier::{Country, DeviceFamily};
use crate::session::status::StatusFlag;
use chrono::{Local, NaiveDateTime, TimeZone};

const DATE_FORMAT: &str = "%Y/%m/%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DEFAULT_POWER_FACTOR: f64 = 0.80;

fn parse_number(label: &str) -> Result<f64, InvalidValue> {
    label
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| InvalidValue::not_a_number(label))
}

/// `device.country`: remembered in the session, never published
#[derive(Debug)]
pub struct CountryCapture;

impl DynamicConversion for CountryCapture {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        let country = Country::from_raw(raw);
        if ctx.session.profile.capture_country(country) {
            tracing::debug!(?country, raw, "device country captured");
        }
        None
    }
}

/// Which half of the device clock a converter publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPart {
    Date,
    Time,
}

impl ClockPart {
    fn format(self) -> &'static str {
        match self {
            ClockPart::Date => DATE_FORMAT,
            ClockPart::Time => TIME_FORMAT,
        }
    }

    /// Variable holding the other half
    fn counterpart(self) -> &'static str {
        match self {
            ClockPart::Date => "ups.time",
            ClockPart::Time => "ups.date",
        }
    }
}

/// `ups.date` / `ups.time` from the device Unix clock, in local time
#[derive(Debug)]
pub struct DeviceClock(pub ClockPart);

impl DynamicConversion for DeviceClock {
    fn forward(&self, raw: f64, _ctx: &mut ConvertContext<'_>) -> Option<String> {
        if !raw.is_finite() {
            return None;
        }
        let moment = Local.timestamp_opt(raw as i64, 0).single()?;
        Some(moment.format(self.0.format()).to_string())
    }

    fn backward(&self, label: &str, ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        let other_name = self.0.counterpart();
        let other = ctx
            .store
            .get(other_name)
            .ok_or_else(|| InvalidValue::missing_context(other_name))?;
        let combined = match self.0 {
            ClockPart::Date => format!("{} {}", label.trim(), other),
            ClockPart::Time => format!("{} {}", other, label.trim()),
        };
        let naive =
            NaiveDateTime::parse_from_str(&combined, &format!("{} {}", DATE_FORMAT, TIME_FORMAT))
                .map_err(|_| InvalidValue::unknown_label(label))?;
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| InvalidValue::unsupported("local time does not exist"))?;
        Ok(local.timestamp() as f64)
    }
}

/// `battery.voltage` from `PowerSummary.Voltage`, only trusted on some series
#[derive(Debug)]
pub struct BatteryVoltage;

impl DynamicConversion for BatteryVoltage {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        ctx.session
            .profile
            .family
            .reports_battery_voltage()
            .then(|| format!("{:.1}", raw))
    }

    fn backward(&self, label: &str, _ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        parse_number(label)
    }
}

/// `battery.voltage.nominal` from `PowerSummary.ConfigVoltage`
#[derive(Debug)]
pub struct NominalBatteryVoltage;

impl DynamicConversion for NominalBatteryVoltage {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        match ctx.session.profile.family {
            DeviceFamily::Evolution650 => Some("12".to_string()),
            family if family.reports_battery_voltage() => Some(format!("{:.0}", raw)),
            _ => None,
        }
    }

    fn backward(&self, label: &str, _ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        parse_number(label)
    }
}

/// Whether `volts` belongs to the output voltage class fixed by `class`
fn output_voltage_admitted(class: f64, volts: f64, family: DeviceFamily) -> bool {
    let online_capable = !family.is_offline();
    match class.round() as i64 {
        100 | 110 | 120 | 127 => matches!(volts.round() as i64, 100 | 110 | 120 | 127),
        200 | 208 => match volts.round() as i64 {
            200 | 208 => true,
            220 | 230 | 240 => online_capable,
            _ => false,
        },
        220 | 230 | 240 => match volts.round() as i64 {
            200 | 208 => online_capable,
            220 | 230 | 240 => true,
            _ => false,
        },
        _ => true,
    }
}

/// `output.voltage.nominal`, limited to the low- or high-voltage class of
/// the first value seen on this connection
#[derive(Debug)]
pub struct NominalOutputVoltage;

impl DynamicConversion for NominalOutputVoltage {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        let profile = &mut ctx.session.profile;
        let class = profile.remember_nominal_output_voltage(raw);
        if output_voltage_admitted(class, raw, profile.family) {
            Some(format!("{:.0}", raw))
        } else {
            tracing::debug!(raw, class, "nominal output voltage outside device class");
            None
        }
    }

    fn backward(&self, label: &str, ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        let volts = parse_number(label)?;
        let profile = &ctx.session.profile;
        match profile.nominal_output_voltage() {
            Some(class) if !output_voltage_admitted(class, volts, profile.family) => Err(
                InvalidValue::unsupported(format!("{} V outside the {} V class", volts, class)),
            ),
            _ => Ok(volts),
        }
    }
}

fn eco_control_allowed(ctx: &ConvertContext<'_>) -> bool {
    let profile = &ctx.session.profile;
    profile.family.supports_eco_control(profile.country())
}

/// Outlet ECO control threshold (Protection Station, Ellipse ECO, 3S)
#[derive(Debug)]
pub struct PegasusThreshold;

impl DynamicConversion for PegasusThreshold {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        eco_control_allowed(ctx).then(|| format!("{:.0}", raw))
    }

    fn backward(&self, label: &str, ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        if !eco_control_allowed(ctx) {
            return Err(InvalidValue::unsupported("no outlet ECO control"));
        }
        match label.trim() {
            "10" => Ok(10.0),
            "25" => Ok(25.0),
            "60" => Ok(60.0),
            _ => Err(InvalidValue::unknown_label(label)),
        }
    }
}

/// yes/no switch for outlet ECO control
#[derive(Debug)]
pub struct PegasusYesNo;

impl DynamicConversion for PegasusYesNo {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        if !eco_control_allowed(ctx) {
            return None;
        }
        Some(if raw == 0.0 { "no" } else { "yes" }.to_string())
    }

    fn backward(&self, label: &str, ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        if !eco_control_allowed(ctx) {
            return Err(InvalidValue::unsupported("no outlet ECO control"));
        }
        match label.trim() {
            "yes" => Ok(1.0),
            "no" => Ok(0.0),
            _ => Err(InvalidValue::unknown_label(label)),
        }
    }
}

/// `ups.realpower` estimate for units without an active power reading:
/// `load% * nominal VA * power factor`. Not invertible.
#[derive(Debug)]
pub struct RealPowerEstimate;

impl DynamicConversion for RealPowerEstimate {
    fn forward(&self, _raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        let load = ctx.published_f64("ups.load")?.trunc();
        let nominal = ctx.published_f64("ups.power.nominal")?.trunc();
        let power_factor = ctx
            .published_f64("output.powerfactor")
            .unwrap_or(DEFAULT_POWER_FACTOR);
        let watts = (load * 0.01 * nominal * power_factor).round();
        Some(format!("{:.0}", watts))
    }
}

/// Kelvin reading published in degrees Celsius. Not invertible: the label
/// is rounded to 0.1 degree, so the Kelvin value cannot be recovered.
#[derive(Debug)]
pub struct KelvinToCelsius;

impl DynamicConversion for KelvinToCelsius {
    fn forward(&self, raw: f64, _ctx: &mut ConvertContext<'_>) -> Option<String> {
        Some(format!("{:.1}", raw - 273.15))
    }
}

/// `online` status token from the main converter, ignored while the unit is off
#[derive(Debug)]
pub struct ConverterOnline;

impl DynamicConversion for ConverterOnline {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        if ctx.session.status.contains(StatusFlag::Off) {
            return None;
        }
        Some(if raw == 0.0 { "!online" } else { "online" }.to_string())
    }
}
