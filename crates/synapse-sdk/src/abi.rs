use num_bigint::BigUint;
use tiny_keccak::{Hasher, Keccak};

use crate::error::DecodeError;
use crate::types::address::Address;

/// ABI words are 32 bytes.
const WORD: usize = 32;

/// Parsed function signature.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ParamType>,
    pub canonical: String,
    pub selector: [u8; 4],
}

/// The ABI parameter types used by pool, bridge and token contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint(usize),
    Bool,
    String,
    Array(Box<ParamType>),
}

impl ParamType {
    /// Whether this type is dynamically-sized in ABI encoding.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamType::String | ParamType::Array(_))
    }
}

/// A value to encode as a call argument or decoded from return data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(BigUint),
    Bool(bool),
    String(String),
    Array(Vec<AbiValue>),
}

impl AbiValue {
    pub fn uint(n: impl Into<BigUint>) -> Self {
        AbiValue::Uint(n.into())
    }

    pub fn as_uint(&self) -> Option<&BigUint> {
        match self {
            AbiValue::Uint(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    hash
}

/// Parse a function signature string into a `FunctionSignature`.
///
/// Example: `"calculateSwap(uint8,uint8,uint256)"` → name="calculateSwap",
/// params=[Uint(8), Uint(8), Uint(256)]
pub fn parse_signature(sig: &str) -> Result<FunctionSignature, DecodeError> {
    let sig = sig.trim();
    let open = sig
        .find('(')
        .ok_or_else(|| DecodeError::InvalidSignature(format!("missing '(' in: {sig}")))?;

    if !sig.ends_with(')') {
        return Err(DecodeError::InvalidSignature(format!(
            "missing ')' in: {sig}"
        )));
    }

    let name = sig[..open].to_string();
    if name.is_empty() {
        return Err(DecodeError::InvalidSignature(
            "empty function name".to_string(),
        ));
    }

    let params = parse_types(&sig[open + 1..sig.len() - 1])?;
    let canonical = format!("{name}({})", canonical_params(&params));
    let selector = selector_from_signature(&canonical);

    Ok(FunctionSignature {
        name,
        params,
        canonical,
        selector,
    })
}

/// Parse a comma separated type list such as `"uint256[],bool"`.
pub fn parse_types(s: &str) -> Result<Vec<ParamType>, DecodeError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(parse_param_type).collect()
}

fn parse_param_type(s: &str) -> Result<ParamType, DecodeError> {
    let s = s.trim();

    if let Some(inner) = s.strip_suffix("[]") {
        return Ok(ParamType::Array(Box::new(parse_param_type(inner)?)));
    }

    match s {
        "address" => Ok(ParamType::Address),
        "bool" => Ok(ParamType::Bool),
        "string" => Ok(ParamType::String),
        _ if s.starts_with("uint") => {
            let digits = &s[4..];
            if digits.is_empty() {
                return Ok(ParamType::Uint(256));
            }
            match digits.parse::<usize>() {
                Ok(bits) if bits > 0 && bits <= 256 && bits % 8 == 0 => Ok(ParamType::Uint(bits)),
                _ => Err(DecodeError::InvalidSignature(format!("invalid uint width: {s}"))),
            }
        }
        _ => Err(DecodeError::InvalidSignature(format!("unsupported type: {s}"))),
    }
}

fn canonical_params(params: &[ParamType]) -> String {
    params
        .iter()
        .map(canonical_param)
        .collect::<Vec<_>>()
        .join(",")
}

fn canonical_param(p: &ParamType) -> String {
    match p {
        ParamType::Address => "address".to_string(),
        ParamType::Uint(bits) => format!("uint{bits}"),
        ParamType::Bool => "bool".to_string(),
        ParamType::String => "string".to_string(),
        ParamType::Array(inner) => format!("{}[]", canonical_param(inner)),
    }
}

/// Compute the 4-byte selector from a canonical function signature.
pub fn selector_from_signature(canonical: &str) -> [u8; 4] {
    let hash = keccak256(canonical.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Build calldata: selector followed by the ABI-encoded arguments.
pub fn encode_call(sig: &FunctionSignature, args: &[AbiValue]) -> Result<Vec<u8>, DecodeError> {
    if args.len() != sig.params.len() {
        return Err(DecodeError::ArgumentMismatch(format!(
            "{} takes {} arguments, got {}",
            sig.name,
            sig.params.len(),
            args.len()
        )));
    }
    let mut calldata = sig.selector.to_vec();
    calldata.extend(encode_sequence(&sig.params, args)?);
    Ok(calldata)
}

/// Decode return data against a list of output types.
pub fn decode_output(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiValue>, DecodeError> {
    decode_sequence(types, data)
}

fn encode_sequence(params: &[ParamType], values: &[AbiValue]) -> Result<Vec<u8>, DecodeError> {
    let head_size = params.len() * WORD;
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (param, value) in params.iter().zip(values) {
        let encoded = encode_value(param, value)?;
        if param.is_dynamic() {
            head.extend_from_slice(&usize_word(head_size + tail.len()));
            tail.extend(encoded);
        } else {
            head.extend(encoded);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn encode_value(param: &ParamType, value: &AbiValue) -> Result<Vec<u8>, DecodeError> {
    match (param, value) {
        (ParamType::Address, AbiValue::Address(addr)) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr.as_bytes());
            Ok(word.to_vec())
        }
        (ParamType::Uint(bits), AbiValue::Uint(n)) => {
            if n.bits() > *bits as u64 {
                return Err(DecodeError::ArgumentMismatch(format!(
                    "{n} does not fit in uint{bits}"
                )));
            }
            Ok(uint_word(n).to_vec())
        }
        (ParamType::Bool, AbiValue::Bool(b)) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*b);
            Ok(word.to_vec())
        }
        (ParamType::String, AbiValue::String(s)) => Ok(encode_packed_bytes(s.as_bytes())),
        (ParamType::Array(inner), AbiValue::Array(items)) => {
            let mut out = usize_word(items.len()).to_vec();
            let params = vec![(**inner).clone(); items.len()];
            out.extend(encode_sequence(&params, items)?);
            Ok(out)
        }
        _ => Err(DecodeError::ArgumentMismatch(format!(
            "cannot encode {value:?} as {}",
            canonical_param(param)
        ))),
    }
}

fn encode_packed_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    out.resize(out.len() + padding, 0);
    out
}

fn uint_word(n: &BigUint) -> [u8; 32] {
    let bytes = n.to_bytes_be();
    let mut word = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    word[start..].copy_from_slice(&bytes[bytes.len() - (32 - start)..]);
    word
}

fn usize_word(n: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

/// Decode a head/tail encoded sequence. Offsets inside `data` are relative
/// to the start of `data`.
fn decode_sequence(params: &[ParamType], data: &[u8]) -> Result<Vec<AbiValue>, DecodeError> {
    let mut values = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let head = i * WORD;
        let value = if param.is_dynamic() {
            let offset = read_u256_as_usize(data, head)?;
            decode_value_at(param, data, offset)?
        } else {
            decode_value_at(param, data, head)?
        };
        values.push(value);
    }
    Ok(values)
}

fn decode_value_at(param: &ParamType, data: &[u8], offset: usize) -> Result<AbiValue, DecodeError> {
    ensure_bytes(data, offset, WORD)?;
    let word = &data[offset..offset + WORD];

    match param {
        ParamType::Address => {
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..32]);
            Ok(AbiValue::Address(Address(addr)))
        }
        ParamType::Uint(_) => Ok(AbiValue::Uint(BigUint::from_bytes_be(word))),
        ParamType::Bool => Ok(AbiValue::Bool(word[31] != 0)),
        ParamType::String => {
            let bytes = read_packed_bytes(data, offset)?;
            let s = std::str::from_utf8(bytes)
                .map_err(|e| DecodeError::InvalidEncoding(format!("invalid UTF-8: {e}")))?;
            Ok(AbiValue::String(s.to_string()))
        }
        ParamType::Array(inner) => {
            let len = read_u256_as_usize(data, offset)?;
            let body = offset + WORD;
            // Every element owns at least one head word; a length the data
            // cannot hold is rejected before anything is allocated.
            let heads = len
                .checked_mul(WORD)
                .ok_or_else(|| DecodeError::InvalidEncoding(format!("array length {len} overflows")))?;
            ensure_bytes(data, body, heads)?;
            let params = vec![(**inner).clone(); len];
            Ok(AbiValue::Array(decode_sequence(&params, &data[body..])?))
        }
    }
}

fn read_packed_bytes(data: &[u8], offset: usize) -> Result<&[u8], DecodeError> {
    let len = read_u256_as_usize(data, offset)?;
    let start = offset + WORD;
    ensure_bytes(data, start, len)?;
    Ok(&data[start..start + len])
}

fn read_u256_as_usize(data: &[u8], offset: usize) -> Result<usize, DecodeError> {
    ensure_bytes(data, offset, WORD)?;
    let word = &data[offset..offset + WORD];
    if word[..24].iter().any(|&b| b != 0) {
        return Err(DecodeError::InvalidEncoding(
            "offset too large for usize".to_string(),
        ));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..32]);
    usize::try_from(u64::from_be_bytes(bytes))
        .map_err(|_| DecodeError::InvalidEncoding("offset too large for usize".to_string()))
}

fn ensure_bytes(data: &[u8], offset: usize, len: usize) -> Result<(), DecodeError> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(DecodeError::DataTooShort {
            expected: offset.saturating_add(len),
            actual: data.len(),
        }),
    }
}

/// Decode a `0x`-prefixed hex string.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}
