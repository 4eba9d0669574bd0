use address_cache_lib::{CacheError, Coordinate};

/// Why an input line is not a point
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Expected `lat,lon`, got {0:?}")]
    Format(String),

    #[error("Invalid number {0:?}")]
    Number(String),

    #[error(transparent)]
    Coordinate(#[from] CacheError),
}

/// Parse a `lat,lon` point, tolerating surrounding whitespace
pub fn parse_point(text: &str) -> Result<Coordinate, InputError> {
    let Some((lat, lon)) = text.trim().split_once(',') else {
        return Err(InputError::Format(text.to_string()));
    };

    let lat = parse_number(lat)?;
    let lon = parse_number(lon)?;
    Ok(Coordinate::new(lat, lon)?)
}

fn parse_number(text: &str) -> Result<f64, InputError> {
    let text = text.trim();
    text.parse()
        .map_err(|_| InputError::Number(text.to_string()))
}
