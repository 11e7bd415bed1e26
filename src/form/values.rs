use crate::form::model::FieldDescriptor;

const PASSWORD_SEED: &str = "P@ssw0rd!";
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 16;
const TEXT_FLOOR: usize = 6;
/// Upper bound on filler text, whatever `minlength` claims.
const TEXT_MAX: usize = 524_288;

/// Synthetic value that should satisfy the field's own constraints.
///
/// Text is capped at `TEXT_MAX` characters even when `minlength` asks for
/// more. `now_ms` feeds the email local part so that two runs more than a
/// millisecond apart never submit the same address.
pub fn valid_value_for(field: &FieldDescriptor, now_ms: u128) -> String {
    let min = field.min_length.unwrap_or(1) as usize;
    let len = min.max(TEXT_FLOOR);

    match field.input_type.as_str() {
        "email" => format!("user{}@example.com", now_ms),
        "password" => {
            let target = len.max(PASSWORD_MIN).min(PASSWORD_MAX);
            let mut value = PASSWORD_SEED.to_string();
            while value.len() < target {
                value.push('1');
            }
            value
        }
        _ => {
            let cap = field.max_length.map(|m| m as usize).unwrap_or(len);
            "x".repeat(len.min(cap).min(TEXT_MAX))
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u128 {
    chrono::Utc::now().timestamp_millis().max(0) as u128
}
