use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Size of one ABI word in bytes
pub const WORD: usize = 32;

// error type
#[derive(Debug, Clone, PartialEq)]
pub enum AbiError {
    InvalidHex(String),
    InvalidAddress(String),
    OutOfBounds { offset: usize, len: usize },
    Overflow(&'static str),
    InvalidUtf8,
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiError::InvalidHex(msg) => write!(f, "Invalid hex: {}", msg),
            AbiError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            AbiError::OutOfBounds { offset, len } => {
                write!(f, "Return data too short: need {} bytes, got {}", offset, len)
            }
            AbiError::Overflow(what) => write!(f, "Value does not fit: {}", what),
            AbiError::InvalidUtf8 => write!(f, "String is not valid UTF-8"),
        }
    }
}

/// 20-byte EVM account or contract address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Sentinel used by Drop contracts for the chain's native token
    pub const NATIVE_TOKEN: Address = Address([0xee; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Shortened form for buttons and labels, e.g. `0x400f…8e73`
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 40 {
            return Err(AbiError::InvalidAddress(format!(
                "expected 40 hex digits, got {}",
                digits.len()
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AbiError::InvalidAddress(format!("{}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Function and error selectors (first four bytes of the keccak hash of the signature)
pub mod selectors {
    pub const NAME: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];
    pub const SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
    pub const CONTRACT_URI: [u8; 4] = [0xe8, 0xa3, 0xd4, 0x85];
    pub const TOTAL_MINTED: [u8; 4] = [0xa2, 0x30, 0x9f, 0xf8];
    pub const NEXT_TOKEN_ID_TO_MINT: [u8; 4] = [0x3b, 0x14, 0x75, 0xa7];
    pub const GET_ACTIVE_CLAIM_CONDITION_ID: [u8; 4] = [0xc6, 0x89, 0x07, 0xde];
    pub const GET_CLAIM_CONDITION_BY_ID: [u8; 4] = [0x6f, 0x89, 0x34, 0xf4];
    /// claim(address,uint256,address,uint256,(bytes32[],uint256,uint256,address),bytes)
    pub const CLAIM: [u8; 4] = [0x84, 0xbb, 0x1e, 0x42];
    /// ERC-20 decimals(), for allowlist prices quoted in a token
    pub const DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

    pub const ERROR_STRING: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
    pub const PANIC: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];
}

pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn decode_hex(data: &str) -> Result<Vec<u8>, AbiError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).map_err(|e| AbiError::InvalidHex(e.to_string()))
}

/// uint256 word for a `u128` amount, where `u128::MAX` stands for `type(uint256).max`
pub fn quantity_word(value: u128) -> [u8; WORD] {
    if value == u128::MAX {
        return [0xff; WORD];
    }
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Builds calldata one word at a time; dynamic parts are laid out by the caller
#[derive(Debug, Clone)]
pub struct CallEncoder {
    buf: Vec<u8>,
}

impl CallEncoder {
    pub fn new(selector: [u8; 4]) -> Self {
        let mut buf = Vec::with_capacity(4 + 8 * WORD);
        buf.extend_from_slice(&selector);
        Self { buf }
    }

    pub fn address(mut self, address: &Address) -> Self {
        self.buf.extend_from_slice(&[0u8; 12]);
        self.buf.extend_from_slice(address.as_bytes());
        self
    }

    pub fn uint(mut self, value: u128) -> Self {
        self.buf.extend_from_slice(&[0u8; 16]);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Like `uint`, but `u128::MAX` is widened to `type(uint256).max`
    pub fn quantity(self, value: u128) -> Self {
        self.word(quantity_word(value))
    }

    pub fn word(mut self, word: [u8; WORD]) -> Self {
        self.buf.extend_from_slice(&word);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads words out of ABI-encoded return data
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], AbiError> {
        let end = offset.checked_add(len).ok_or(AbiError::Overflow("offset"))?;
        self.data.get(offset..end).ok_or(AbiError::OutOfBounds {
            offset: end,
            len: self.data.len(),
        })
    }

    pub fn word_at(&self, offset: usize) -> Result<[u8; WORD], AbiError> {
        let mut word = [0u8; WORD];
        word.copy_from_slice(self.slice(offset, WORD)?);
        Ok(word)
    }

    pub fn uint_at(&self, offset: usize) -> Result<u128, AbiError> {
        let word = self.slice(offset, WORD)?;
        if word[..16].iter().any(|b| *b != 0) {
            return Err(AbiError::Overflow("uint256 exceeds u128"));
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(low))
    }

    pub fn u64_at(&self, offset: usize) -> Result<u64, AbiError> {
        u64::try_from(self.uint_at(offset)?).map_err(|_| AbiError::Overflow("uint256 exceeds u64"))
    }

    pub fn usize_at(&self, offset: usize) -> Result<usize, AbiError> {
        usize::try_from(self.uint_at(offset)?).map_err(|_| AbiError::Overflow("offset exceeds usize"))
    }

    pub fn address_at(&self, offset: usize) -> Result<Address, AbiError> {
        let word = self.slice(offset, WORD)?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::new(bytes))
    }

    /// Dynamic `string` whose head word sits at `head`; offsets are relative to `base`
    pub fn string_at(&self, base: usize, head: usize) -> Result<String, AbiError> {
        let start = base + self.usize_at(head)?;
        let len = self.usize_at(start)?;
        let bytes = self.slice(start + WORD, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
    }
}

pub fn decode_uint(data: &[u8]) -> Result<u128, AbiError> {
    Decoder::new(data).uint_at(0)
}

pub fn decode_string(data: &[u8]) -> Result<String, AbiError> {
    Decoder::new(data).string_at(0, 0)
}

#[derive(Debug, Clone, Copy)]
enum ArgKind {
    Uint,
    Address,
}

// custom errors raised by Drop contracts
const KNOWN_ERRORS: &[([u8; 4], &str, &[ArgKind])] = &[
    ([0x9e, 0x77, 0x62, 0xdb], "DropClaimExceedLimit", &[ArgKind::Uint, ArgKind::Uint]),
    ([0xfe, 0x38, 0x1c, 0xc9], "DropClaimExceedMaxSupply", &[ArgKind::Uint, ArgKind::Uint]),
    (
        [0xf1, 0x34, 0x74, 0xe9],
        "DropClaimInvalidTokenPrice",
        &[ArgKind::Address, ArgKind::Uint, ArgKind::Address, ArgKind::Uint],
    ),
    ([0xf4, 0x0f, 0x1c, 0xc0], "DropNoActiveCondition", &[]),
    ([0x56, 0xc4, 0xef, 0x51], "DropUnauthorized", &[]),
];

/// Turns revert data into a readable reason.
///
/// Handles `Error(string)`, `Panic(uint256)` and the Drop custom errors.
/// Returns `None` for empty or unrecognised data.
pub fn decode_revert(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    let args = Decoder::new(&data[4..]);

    if selector == selectors::ERROR_STRING {
        return args.string_at(0, 0).ok();
    }
    if selector == selectors::PANIC {
        return args.uint_at(0).ok().map(|code| format!("Panic(0x{:02x})", code));
    }

    let (_, name, kinds) = KNOWN_ERRORS.iter().find(|(sel, _, _)| *sel == selector)?;
    let mut rendered = Vec::with_capacity(kinds.len());
    for (i, kind) in kinds.iter().enumerate() {
        let value = match kind {
            ArgKind::Uint => match args.uint_at(i * WORD) {
                Ok(v) => v.to_string(),
                Err(AbiError::Overflow(_)) => "max".to_string(),
                Err(_) => return Some(name.to_string()),
            },
            ArgKind::Address => match args.address_at(i * WORD) {
                Ok(a) => a.to_string(),
                Err(_) => return Some(name.to_string()),
            },
        };
        rendered.push(value);
    }
    Some(format!("{}({})", name, rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint_word(v: u128) -> Vec<u8> {
        CallEncoder::new([0; 4]).uint(v).finish()[4..].to_vec()
    }

    #[test]
    fn test_address_parse_and_display() {
        let addr: Address = "0x400F8432253A7CaF458062c4C2632230c83B8e73".parse().unwrap();
        assert_eq!(addr.to_string(), "0x400f8432253a7caf458062c4c2632230c83b8e73");
        assert_eq!(addr.short(), "0x400f…8e73");
        assert!(!addr.is_zero());
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz0F8432253A7CaF458062c4C2632230c83B8e73".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serde_as_string() {
        let json = serde_json::to_string(&Address::NATIVE_TOKEN).unwrap();
        assert_eq!(json, "\"0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Address::NATIVE_TOKEN);
    }

    #[test]
    fn test_call_encoder_layout() {
        let to: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        let data = CallEncoder::new(selectors::CLAIM).address(&to).uint(1).finish();
        assert_eq!(data.len(), 4 + 2 * WORD);
        assert_eq!(&data[..4], &selectors::CLAIM);
        assert_eq!(data[4 + 31], 0xaa);
        assert_eq!(data[4 + 2 * WORD - 1], 1);
    }

    #[test]
    fn test_quantity_word_widens_max() {
        assert_eq!(quantity_word(u128::MAX), [0xff; WORD]);
        let word = quantity_word(0x0102);
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(&word[30..], &[0x01, 0x02]);
        let data = CallEncoder::new([0; 4]).quantity(u128::MAX).quantity(7).finish();
        assert_eq!(&data[4..4 + WORD], &[0xff; WORD]);
        assert_eq!(decode_uint(&data[4 + WORD..]).unwrap(), 7);
    }

    #[test]
    fn test_decode_uint_overflow() {
        let mut word = vec![0u8; WORD];
        word[0] = 1;
        assert!(matches!(decode_uint(&word), Err(AbiError::Overflow(_))));
        assert_eq!(decode_uint(&uint_word(42)).unwrap(), 42);
    }

    #[test]
    fn test_decode_string() {
        let mut data = uint_word(0x20);
        data.extend(uint_word(5));
        let mut text = b"Hello".to_vec();
        text.resize(WORD, 0);
        data.extend(text);
        assert_eq!(decode_string(&data).unwrap(), "Hello");
    }

    #[test]
    fn test_decode_short_data_is_error() {
        assert!(matches!(decode_uint(&[0u8; 8]), Err(AbiError::OutOfBounds { .. })));
    }

    #[test]
    fn test_decode_revert_error_string() {
        let mut data = selectors::ERROR_STRING.to_vec();
        data.extend(uint_word(0x20));
        data.extend(uint_word(4));
        let mut text = b"!Qty".to_vec();
        text.resize(WORD, 0);
        data.extend(text);
        assert_eq!(decode_revert(&data).as_deref(), Some("!Qty"));
    }

    #[test]
    fn test_decode_revert_custom_error() {
        let mut data = vec![0x9e, 0x77, 0x62, 0xdb];
        data.extend(uint_word(1));
        data.extend(uint_word(1));
        assert_eq!(decode_revert(&data).as_deref(), Some("DropClaimExceedLimit(1, 1)"));
    }

    #[test]
    fn test_decode_revert_unknown() {
        assert_eq!(decode_revert(&[0xde, 0xad, 0xbe, 0xef]), None);
        assert_eq!(decode_revert(&[]), None);
    }
}
