//! Per-sensor payload handlers.
//!
//! Handlers are permissive: a state topic compares its payload case-insensitively against
//! one keyword and treats anything else as the negative case. Only the LED has no negative
//! case, an unknown colour leaves its display untouched.

use super::topics::Sensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Red,
    Green,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SensorDisplay {
    /// `None` when the payload has no leading number
    Temperature(Option<f64>),
    Infrared { detected: bool },
    Servo { open: bool },
    Led(LedColor),
}

impl SensorDisplay {
    pub fn label(&self) -> String {
        match self {
            SensorDisplay::Temperature(Some(celsius)) => format!("{}°C", one_decimal(*celsius)),
            SensorDisplay::Temperature(None) => "--°C".to_string(),
            SensorDisplay::Infrared { detected: true } => "DETECTED".to_string(),
            SensorDisplay::Infrared { detected: false } => "NOT DETECTED".to_string(),
            SensorDisplay::Servo { open: true } => "OPEN".to_string(),
            SensorDisplay::Servo { open: false } => "CLOSED".to_string(),
            SensorDisplay::Led(LedColor::Red) => "RED".to_string(),
            SensorDisplay::Led(LedColor::Green) => "GREEN".to_string(),
        }
    }

    /// Whether the value is the "attention" case (open, detected, red).
    pub fn is_active(&self) -> bool {
        match self {
            SensorDisplay::Temperature(_) => false,
            SensorDisplay::Infrared { detected } => *detected,
            SensorDisplay::Servo { open } => *open,
            SensorDisplay::Led(color) => *color == LedColor::Red,
        }
    }
}

/// One decimal place, exact ties rounded away from zero (`22.25` → `22.3`).
///
/// `{:.1}` alone rounds ties to even. A value sits exactly between two tenths only if four
/// times its magnitude is an odd integer, so only those values are nudged.
fn one_decimal(value: f64) -> String {
    let quarters = value.abs() * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 == 1.0 {
        format!("{:.1}", value + 0.05_f64.copysign(value))
    } else {
        format!("{:.1}", value)
    }
}

/// Turns a payload into what the sensor's card should show, `None` leaves the card as is.
pub fn interpret(sensor: Sensor, payload: &str) -> Option<SensorDisplay> {
    match sensor {
        Sensor::Temperature => Some(SensorDisplay::Temperature(parse_leading_float(payload))),
        Sensor::Infrared => Some(SensorDisplay::Infrared {
            detected: payload.eq_ignore_ascii_case("DETECTED"),
        }),
        Sensor::Servo => Some(SensorDisplay::Servo {
            open: payload.eq_ignore_ascii_case("OPEN"),
        }),
        Sensor::Led => {
            if payload.eq_ignore_ascii_case("RED") {
                Some(SensorDisplay::Led(LedColor::Red))
            } else if payload.eq_ignore_ascii_case("GREEN") {
                Some(SensorDisplay::Led(LedColor::Green))
            } else {
                None
            }
        }
    }
}

/// Longest leading decimal number of `payload`, ignoring leading whitespace.
///
/// `"23.7"`, `" 23.7"` and `"23.7 C"` all give `23.7`. A dangling `.` or exponent marker
/// ends the number (`"5.e"` gives `5`).
pub fn parse_leading_float(payload: &str) -> Option<f64> {
    let bytes = payload.trim_start().as_bytes();
    let mut number = String::new();
    let mut pos = 0;

    if let Some(&sign @ (b'+' | b'-')) = bytes.first() {
        number.push(sign as char);
        pos += 1;
    }

    let mut digits = take_digits(bytes, &mut pos, &mut number);
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        let mut fraction = String::from(".");
        let fraction_digits = take_digits(bytes, &mut pos, &mut fraction);
        if fraction_digits > 0 {
            number.push_str(&fraction);
        }
        digits += fraction_digits;
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut after = pos + 1;
        let mut exponent = String::from("e");
        if let Some(&sign @ (b'+' | b'-')) = bytes.get(after) {
            exponent.push(sign as char);
            after += 1;
        }
        if take_digits(bytes, &mut after, &mut exponent) > 0 {
            number.push_str(&exponent);
        }
    }

    number.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn take_digits(bytes: &[u8], pos: &mut usize, out: &mut String) -> usize {
    let start = *pos;
    while let Some(&digit) = bytes.get(*pos).filter(|b| b.is_ascii_digit()) {
        out.push(digit as char);
        *pos += 1;
    }
    *pos - start
}
