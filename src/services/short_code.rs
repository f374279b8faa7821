use ring::rand::{SecureRandom, SystemRandom};

/// Uppercase letters and digits without the look-alikes 0/O and 1/I/L
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 6;

#[derive(thiserror::Error, Debug)]
#[error("Random number generator failure")]
pub struct ShortCodeError;

/// Generates a random code for a new dynamic route
pub fn generate() -> Result<String, ShortCodeError> {
    generate_with(&SystemRandom::new(), CODE_LENGTH)
}

pub fn generate_with(rng: &dyn SecureRandom, length: usize) -> Result<String, ShortCodeError> {
    // Rejection sampling keeps every symbol equally likely
    let limit = (u8::MAX as usize + 1) / ALPHABET.len() * ALPHABET.len();
    let mut code = String::with_capacity(length);
    let mut buf = [0u8; 16];

    while code.len() < length {
        rng.fill(&mut buf).map_err(|_| ShortCodeError)?;
        for byte in buf {
            if (byte as usize) < limit && code.len() < length {
                code.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
            }
        }
    }

    Ok(code)
}

/// Checks a code chosen by hand: 3 to 32 uppercase letters, digits or dashes
pub fn validate(code: &str) -> Result<(), String> {
    if !(3..=32).contains(&code.len()) {
        return Err("Code must be between 3 and 32 characters".to_string());
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Code may only contain letters, digits and dashes".to_string());
    }
    Ok(())
}
