//! Coercion of loosely typed input into a weather code.
//!
//! Weather codes arrive as JSON numbers (often floats such as `3.0`), plain
//! integers, or text. Every input either coerces to a whole number or yields
//! `None`, which the translator maps to the unknown sentinel.

use serde_json::{Number, Value};

/// Conversion into a whole-number weather code.
///
/// Rules:
/// - integers convert directly (out of `i64` range yields `None`)
/// - floats convert only when finite and whole (`2.0` yes, `3.5` and NaN no)
/// - text is trimmed, then parsed as an integer or as a whole-valued float
/// - absent values, booleans, arrays and objects yield `None`
///
/// Negative or unknown codes still convert; they simply miss the table.
pub trait AsWeatherCode {
    fn as_weather_code(&self) -> Option<i64>;
}

/// Convert a float to an integer if it represents one exactly.
pub fn whole_number(value: f64) -> Option<i64> {
    // 2^63 is exactly representable, i64::MAX is not
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < -UPPER || value >= UPPER {
        return None;
    }
    Some(value as i64)
}

macro_rules! impl_integer_code {
    ($($ty:ty),*) => {
        $(
            impl AsWeatherCode for $ty {
                fn as_weather_code(&self) -> Option<i64> {
                    i64::try_from(*self).ok()
                }
            }
        )*
    };
}

impl_integer_code!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl AsWeatherCode for f64 {
    fn as_weather_code(&self) -> Option<i64> {
        whole_number(*self)
    }
}

impl AsWeatherCode for f32 {
    fn as_weather_code(&self) -> Option<i64> {
        whole_number(f64::from(*self))
    }
}

impl AsWeatherCode for str {
    fn as_weather_code(&self) -> Option<i64> {
        let text = self.trim();
        text.parse::<i64>()
            .ok()
            .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
    }
}

impl AsWeatherCode for String {
    fn as_weather_code(&self) -> Option<i64> {
        self.as_str().as_weather_code()
    }
}

impl AsWeatherCode for Number {
    fn as_weather_code(&self) -> Option<i64> {
        if let Some(value) = self.as_i64() {
            return Some(value);
        }
        if self.is_u64() {
            // Above i64::MAX
            return None;
        }
        self.as_f64().and_then(whole_number)
    }
}

impl AsWeatherCode for Value {
    fn as_weather_code(&self) -> Option<i64> {
        match self {
            Value::Number(number) => number.as_weather_code(),
            Value::String(text) => text.as_weather_code(),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl<T: AsWeatherCode> AsWeatherCode for Option<T> {
    fn as_weather_code(&self) -> Option<i64> {
        self.as_ref().and_then(|value| value.as_weather_code())
    }
}

impl<T: AsWeatherCode + ?Sized> AsWeatherCode for &T {
    fn as_weather_code(&self) -> Option<i64> {
        (**self).as_weather_code()
    }
}
