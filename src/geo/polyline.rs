//! Decoder for the encoded polyline format used by directions providers
//! (precision 1e-5, zig-zag deltas in 5-bit chunks offset by 63).

use thiserror::Error;

use crate::models::location::GeoPoint;

const PRECISION: f64 = 1e5;

#[derive(Debug, Error, PartialEq)]
pub enum PolylineError {
    #[error("invalid polyline byte {byte:#x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },

    #[error("polyline ended in the middle of a value")]
    Truncated,

    #[error("polyline value at offset {0} does not fit in 64 bits")]
    Overflow(usize),
}

pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut offset = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;

    while offset < bytes.len() {
        let start = offset;
        lat = lat
            .checked_add(next_delta(bytes, &mut offset)?)
            .ok_or(PolylineError::Overflow(start))?;
        let start = offset;
        lng = lng
            .checked_add(next_delta(bytes, &mut offset)?)
            .ok_or(PolylineError::Overflow(start))?;

        points.push(GeoPoint {
            lat: lat as f64 / PRECISION,
            lng: lng as f64 / PRECISION,
        });
    }

    Ok(points)
}

fn next_delta(bytes: &[u8], offset: &mut usize) -> Result<i64, PolylineError> {
    let mut result = 0i64;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(*offset).ok_or(PolylineError::Truncated)?;
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidByte {
                byte,
                offset: *offset,
            });
        }
        if shift > 60 {
            return Err(PolylineError::Overflow(*offset));
        }

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        *offset += 1;

        if chunk < 0x20 {
            break;
        }
    }

    if result & 1 == 1 {
        Ok(!(result >> 1))
    } else {
        Ok(result >> 1)
    }
}
