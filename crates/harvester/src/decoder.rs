use serde_json::{json, Value as JsonValue};

use hrv_scale::{
    blake2_256, decode_value, Address, Era, ScaleError, ScaleReader, SpecMetadata, TypeRegistry,
};


/// How the signer of a block's extrinsics is laid out on the wire.
///
/// One early Alexander block wrote bare 32 byte account ids instead of
/// the usual address envelope; its hash selects the bare form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerLayout {
    Envelope,
    BareAccountId,
}


const LAYOUT_OVERRIDES: &[(&str, SignerLayout)] = &[(
    "0x911a0bf66d5494b6b24f612b3cc14841134c6b73ab9ce02f7e012973070e5661",
    SignerLayout::BareAccountId,
)];


pub fn signer_layout(block_hash: &str) -> SignerLayout {
    LAYOUT_OVERRIDES
        .iter()
        .find(|(hash, _)| *hash == block_hash)
        .map(|(_, layout)| *layout)
        .unwrap_or(SignerLayout::Envelope)
}


/// One extrinsic taken apart.
///
/// `params` is an array of `{name, type, value, valueRaw}` objects in
/// call argument order. When an argument type has no decoder the entry
/// keeps the raw remainder under `valueRaw` with a null `value`, and
/// `codec_error` is set instead of failing the block.
#[derive(Debug, Clone)]
pub struct DecodedExtrinsic {
    pub length: u32,
    /// Raw version byte including the signed bit.
    pub version_info: u8,
    pub signed: bool,
    pub address: Option<Address>,
    /// Envelope discriminator byte of the address, when one was read.
    pub address_kind: Option<u8>,
    /// Signature hex, no 0x.
    pub signature: Option<String>,
    pub nonce: Option<u64>,
    pub era: Option<String>,
    /// Two byte call code, hex.
    pub call: String,
    pub module_id: String,
    pub call_id: String,
    pub params: JsonValue,
    /// Hash over the full raw bytes, signed extrinsics only.
    pub hash: Option<String>,
    pub codec_error: bool,
}


pub fn decode_extrinsic(
    registry: &TypeRegistry,
    meta: &SpecMetadata,
    raw: &[u8],
    layout: SignerLayout,
) -> Result<DecodedExtrinsic, ScaleError> {
    let mut input = ScaleReader::new(raw);
    let length = input.compact_u32()?;
    let version_info = input.byte()?;
    let signed = version_info & 0b1000_0000 != 0;
    let version = version_info & 0b0111_1111;
    if !(1..=4).contains(&version) {
        return Err(ScaleError::invalid(format!(
            "extrinsic version {version} is not supported"
        )));
    }

    let mut address = None;
    let mut address_kind = None;
    let mut signature = None;
    let mut nonce = None;
    let mut era = None;

    if signed {
        let (addr, kind) = read_signer(&mut input, raw, layout)?;
        address = Some(addr);
        address_kind = kind;
        // v4 inserts a multi-signature discriminator before the bytes
        if version == 4 {
            input.byte()?;
        }
        signature = Some(hex::encode(input.bytes(64)?));
        match version {
            1 => {
                nonce = Some(input.compact_u128()? as u64);
                era = Some(Era::decode(&mut input)?.to_hex());
            }
            _ => {
                era = Some(Era::decode(&mut input)?.to_hex());
                nonce = Some(input.compact_u128()? as u64);
                let _tip = input.compact_u128()?;
            }
        }
    }

    let module_index = input.byte()?;
    let call_index = input.byte()?;
    let (module, call) = meta.call_by_index(module_index, call_index).ok_or_else(|| {
        ScaleError::invalid(format!(
            "no call at index {module_index:02x}{call_index:02x}"
        ))
    })?;

    let mut params = Vec::with_capacity(call.args.len());
    let mut codec_error = false;
    for arg in &call.args {
        let start = input.pos();
        match decode_value(registry, &arg.ty, &mut input) {
            Ok(value) => params.push(json!({
                "name": arg.name,
                "type": arg.ty,
                "value": value,
                "valueRaw": hex::encode(input.taken_since(start)),
            })),
            Err(ScaleError::UnsupportedType(_)) => {
                // keep the undecoded tail so nothing is silently dropped
                params.push(json!({
                    "name": arg.name,
                    "type": arg.ty,
                    "value": JsonValue::Null,
                    "valueRaw": hex::encode(&raw[start..]),
                }));
                codec_error = true;
                input.bytes(input.remaining())?;
                break;
            }
            Err(e) => return Err(e),
        }
    }
    input.expect_end()?;

    let hash = signed.then(|| hex::encode(blake2_256(raw)));

    Ok(DecodedExtrinsic {
        length,
        version_info,
        signed,
        address,
        address_kind,
        signature,
        nonce,
        era,
        call: format!("{module_index:02x}{call_index:02x}"),
        module_id: module.id.clone(),
        call_id: call.name.clone(),
        params: JsonValue::Array(params),
        hash,
        codec_error,
    })
}


fn read_signer(
    input: &mut ScaleReader<'_>,
    raw: &[u8],
    layout: SignerLayout,
) -> Result<(Address, Option<u8>), ScaleError> {
    match layout {
        SignerLayout::Envelope => {
            let start = input.pos();
            let address = Address::decode(input)?;
            Ok((address, Some(raw[start])))
        }
        SignerLayout::BareAccountId => {
            let bytes = input.bytes(32)?;
            let mut id = [0u8; 32];
            id.copy_from_slice(bytes);
            Ok((Address::Id(id), None))
        }
    }
}


/// One record out of the `System.Events` storage value.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// 0 while applying an extrinsic, 1 at finalization, 2 at initialization.
    pub phase: u32,
    pub extrinsic_idx: Option<u32>,
    pub lookup: String,
    pub module_id: String,
    pub event_id: String,
    /// Array of `{type, value, valueRaw}` in attribute order.
    pub attributes: JsonValue,
}


pub fn decode_events(
    registry: &TypeRegistry,
    meta: &SpecMetadata,
    raw: &[u8],
) -> Result<Vec<EventRecord>, ScaleError> {
    let mut input = ScaleReader::new(raw);
    let count = input.compact_len()?;
    let mut records = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let phase = u32::from(input.byte()?);
        let extrinsic_idx = if phase == 0 { Some(input.u32()?) } else { None };
        let module_index = input.byte()?;
        let event_index = input.byte()?;
        let (module, event) = meta.event_by_index(module_index, event_index).ok_or_else(|| {
            ScaleError::invalid(format!(
                "no event at index {module_index:02x}{event_index:02x}"
            ))
        })?;
        let mut attributes = Vec::with_capacity(event.args.len());
        for ty in &event.args {
            let start = input.pos();
            let value = decode_value(registry, ty, &mut input)?;
            attributes.push(json!({
                "type": ty,
                "value": value,
                "valueRaw": hex::encode(input.taken_since(start)),
            }));
        }
        let topics = input.compact_len()?;
        for _ in 0..topics {
            input.bytes(32)?;
        }
        records.push(EventRecord {
            phase,
            extrinsic_idx,
            lookup: event.lookup.clone(),
            module_id: module.id.clone(),
            event_id: event.name.clone(),
            attributes: JsonValue::Array(attributes),
        });
    }
    input.expect_end()?;
    Ok(records)
}
