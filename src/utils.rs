use crate::errors::ArborError;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

// Validation
pub fn validate_positive_float_parameter(value: f64, parameter: &str) -> Result<(), ArborError> {
    validate_float_parameter(value, 0.0, f64::INFINITY, parameter)
}

pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), ArborError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(ArborError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Round a value to a fixed number of decimal places.
pub fn precision_round(n: f64, precision: i32) -> f64 {
    let p = (10.0_f64).powi(precision);
    (n * p).round() / p
}

/// Index of the largest value, the first one wins on ties.
pub fn first_max_by<T, F>(items: &[T], mut key: F) -> Option<usize>
where
    F: FnMut(&T) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, item) in items.iter().enumerate() {
        let k = key(item);
        match best {
            Some((_, b)) if k <= b => (),
            _ => best = Some((i, k)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_float_parameter() {
        assert!(validate_positive_float_parameter(0.0, "min_dispersion").is_ok());
        assert!(validate_positive_float_parameter(0.1, "min_dispersion").is_ok());
        assert!(validate_positive_float_parameter(-0.1, "min_dispersion").is_err());
        assert!(validate_positive_float_parameter(f64::NAN, "min_dispersion").is_err());
    }

    #[test]
    fn test_precision_round() {
        assert_eq!(precision_round(0.123456, 3), 0.123);
        assert_eq!(precision_round(2.5, 0), 3.0);
    }

    #[test]
    fn test_first_max_by() {
        let v = vec![1.0, 3.0, 2.0, 3.0];
        assert_eq!(first_max_by(&v, |x| *x), Some(1));
        let e: Vec<f64> = Vec::new();
        assert_eq!(first_max_by(&e, |x| *x), None);
    }
}
