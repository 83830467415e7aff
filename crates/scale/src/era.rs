use crate::error::ScaleError;
use crate::reader::ScaleReader;


/// Mortality of a signed extrinsic.
///
/// The mortal form keeps the two raw bytes around because they are what gets
/// persisted alongside the derived period and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Immortal,
    Mortal {
        period: u64,
        phase: u64,
        encoded: [u8; 2],
    },
}


impl Era {
    pub fn decode(input: &mut ScaleReader<'_>) -> Result<Self, ScaleError> {
        let b0 = input.byte()?;
        if b0 == 0 {
            return Ok(Era::Immortal);
        }
        let b1 = input.byte()?;
        let encoded = u16::from_le_bytes([b0, b1]);
        let period = 2u64 << (encoded % (1 << 4));
        let quantize_factor = (period >> 12).max(1);
        let phase = (encoded >> 4) as u64 * quantize_factor;
        Ok(Era::Mortal {
            period,
            phase,
            encoded: [b0, b1],
        })
    }

    pub fn to_hex(&self) -> String {
        match self {
            Era::Immortal => "00".to_string(),
            Era::Mortal { encoded, .. } => hex::encode(encoded),
        }
    }
}
