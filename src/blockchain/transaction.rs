//! Transfer transaction construction and the legacy wire format.
//!
//! # Responsibilities
//! - Build the single-instruction system transfer message
//! - Serialize unsigned transactions with zeroed signature slots
//! - Decode what the remote signer returns and verify its signatures
//!
//! # Wire format
//! ```text
//! transaction = compact_u16(n_sigs) || signature[64] * n_sigs || message
//! message     = header[3] || compact_u16(n_keys) || key[32] * n_keys
//!               || recent_blockhash[32] || compact_u16(n_ix) || instruction * n_ix
//! instruction = program_index u8 || compact_u16(n) || account_index u8 * n
//!               || compact_u16(len) || data
//! ```

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use thiserror::Error;

use crate::blockchain::types::{Hash, Pubkey, Signature, TransactionId, PUBKEY_LEN, SIGNATURE_LEN};
use crate::error::SigningError;

/// The system program owns native SOL transfers.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new([0u8; PUBKEY_LEN]);

/// Index of `Transfer` in the system program instruction enum.
const SYSTEM_TRANSFER_TAG: u32 = 2;

/// Maximum serialized transaction size accepted by the network.
pub const PACKET_DATA_SIZE: usize = 1232;

/// Errors decoding wire bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),

    #[error("invalid compact-u16 length prefix at offset {0}")]
    InvalidCompactU16(usize),

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("signature count {signatures} does not match required signers {required}")]
    SignatureCountMismatch { signatures: usize, required: usize },

    #[error("account index {index} out of range for {keys} keys")]
    IndexOutOfRange { index: u8, keys: usize },

    #[error("malformed message header: {0}")]
    MalformedHeader(String),
}

/// Account reference inside an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Uncompiled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// System program transfer of `lamports` from `from` to `to`.
pub fn system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_TAG.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            AccountMeta { pubkey: *from, is_signer: true, is_writable: true },
            AccountMeta { pubkey: *to, is_signer: false, is_writable: true },
        ],
        data,
    }
}

/// Message header: signer and read-only account counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// Instruction with accounts replaced by indices into the message key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile a one-instruction message with `payer` as the first signer.
    pub fn new_with_payer(instruction: &Instruction, payer: &Pubkey, recent_blockhash: Hash) -> Self {
        // (key, is_signer, is_writable) in first-seen order, payer first
        let mut metas: Vec<(Pubkey, bool, bool)> = vec![(*payer, true, true)];
        let mut merge = |key: Pubkey, signer: bool, writable: bool| {
            match metas.iter_mut().find(|(k, _, _)| *k == key) {
                Some(entry) => {
                    entry.1 |= signer;
                    entry.2 |= writable;
                }
                None => metas.push((key, signer, writable)),
            }
        };
        for meta in &instruction.accounts {
            merge(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        merge(instruction.program_id, false, false);

        let group = |signer: bool, writable: bool| {
            metas
                .iter()
                .filter(move |(_, s, w)| *s == signer && *w == writable)
                .map(|(k, _, _)| *k)
        };
        let writable_signed: Vec<Pubkey> = group(true, true).collect();
        let readonly_signed: Vec<Pubkey> = group(true, false).collect();
        let writable_unsigned: Vec<Pubkey> = group(false, true).collect();
        let readonly_unsigned: Vec<Pubkey> = group(false, false).collect();

        let header = MessageHeader {
            num_required_signatures: (writable_signed.len() + readonly_signed.len()) as u8,
            num_readonly_signed_accounts: readonly_signed.len() as u8,
            num_readonly_unsigned_accounts: readonly_unsigned.len() as u8,
        };

        let account_keys: Vec<Pubkey> = writable_signed
            .into_iter()
            .chain(readonly_signed)
            .chain(writable_unsigned)
            .chain(readonly_unsigned)
            .collect();

        let position = |key: &Pubkey| -> u8 {
            // Every key was inserted above
            account_keys.iter().position(|k| k == key).unwrap_or_default() as u8
        };
        let compiled = CompiledInstruction {
            program_id_index: position(&instruction.program_id),
            accounts: instruction.accounts.iter().map(|m| position(&m.pubkey)).collect(),
            data: instruction.data.clone(),
        };

        Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: vec![compiled],
        }
    }

    /// Keys that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        let n = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Fee payer is always the first key.
    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.account_keys.first()
    }

    /// Bytes covered by every signature.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        encode_compact_u16(self.account_keys.len() as u16, &mut out);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(&self.recent_blockhash.0);

        encode_compact_u16(self.instructions.len() as u16, &mut out);
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_compact_u16(ix.accounts.len() as u16, &mut out);
            out.extend_from_slice(&ix.accounts);
            encode_compact_u16(ix.data.len() as u16, &mut out);
            out.extend_from_slice(&ix.data);
        }
        out
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        let header = MessageHeader {
            num_required_signatures: reader.byte()?,
            num_readonly_signed_accounts: reader.byte()?,
            num_readonly_unsigned_accounts: reader.byte()?,
        };

        let key_count = reader.compact_u16()? as usize;
        let mut account_keys = Vec::with_capacity(key_count);
        for _ in 0..key_count {
            account_keys.push(Pubkey(reader.array::<PUBKEY_LEN>()?));
        }

        let required = header.num_required_signatures as usize;
        if required == 0 || required > key_count {
            return Err(WireError::MalformedHeader(format!(
                "{} required signatures for {} keys",
                required, key_count
            )));
        }
        if header.num_readonly_signed_accounts as usize >= required
            || header.num_readonly_unsigned_accounts as usize > key_count - required
        {
            return Err(WireError::MalformedHeader("read-only counts out of range".to_string()));
        }

        let recent_blockhash = Hash(reader.array::<32>()?);

        let ix_count = reader.compact_u16()? as usize;
        let mut instructions = Vec::with_capacity(ix_count);
        for _ in 0..ix_count {
            let program_id_index = reader.byte()?;
            let accounts_len = reader.compact_u16()? as usize;
            let accounts = reader.take(accounts_len)?.to_vec();
            let data_len = reader.compact_u16()? as usize;
            let data = reader.take(data_len)?.to_vec();

            for index in std::iter::once(program_id_index).chain(accounts.iter().copied()) {
                if index as usize >= key_count {
                    return Err(WireError::IndexOutOfRange { index, keys: key_count });
                }
            }
            instructions.push(CompiledInstruction { program_id_index, accounts, data });
        }

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }
}

/// A transaction: signature slots plus the message they cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    /// Unsigned transfer with one zeroed slot per required signer.
    pub fn new_transfer(payer: &Pubkey, destination: &Pubkey, lamports: u64, recent_blockhash: Hash) -> Self {
        let instruction = system_transfer(payer, destination, lamports);
        Self::new_unsigned(Message::new_with_payer(&instruction, payer, recent_blockhash))
    }

    pub fn new_unsigned(message: Message) -> Self {
        let slots = message.header.num_required_signatures as usize;
        Self {
            signatures: vec![Signature::default(); slots],
            message,
        }
    }

    /// Full wire encoding, signatures first.
    pub fn serialize(&self) -> Vec<u8> {
        let message = self.message.serialize();
        let mut out = Vec::with_capacity(3 + self.signatures.len() * SIGNATURE_LEN + message.len());
        encode_compact_u16(self.signatures.len() as u16, &mut out);
        for sig in &self.signatures {
            out.extend_from_slice(&sig.0);
        }
        out.extend_from_slice(&message);
        out
    }

    /// Decode wire bytes. Rejects trailing data and mismatched signature counts.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = Reader::new(bytes);

        let sig_count = reader.compact_u16()? as usize;
        let mut signatures = Vec::with_capacity(sig_count);
        for _ in 0..sig_count {
            signatures.push(Signature(reader.array::<SIGNATURE_LEN>()?));
        }

        let message = Message::decode(&mut reader)?;
        if reader.remaining() > 0 {
            return Err(WireError::TrailingBytes(reader.remaining()));
        }

        let required = message.header.num_required_signatures as usize;
        if sig_count != required {
            return Err(WireError::SignatureCountMismatch {
                signatures: sig_count,
                required,
            });
        }

        Ok(Self { signatures, message })
    }

    /// Bytes the signers sign.
    pub fn message_data(&self) -> Vec<u8> {
        self.message.serialize()
    }

    /// Check every signature slot against its signer key.
    ///
    /// Empty slots fail: a single-payer transfer has no co-signers to wait for.
    pub fn verify_signatures(&self) -> Result<(), SigningError> {
        let message = self.message_data();
        for (sig, key) in self.signatures.iter().zip(self.message.signer_keys()) {
            let invalid = || SigningError::InvalidSignature { signer: key.to_string() };
            if sig.is_empty() {
                return Err(invalid());
            }
            let verifying_key = VerifyingKey::from_bytes(key.as_bytes()).map_err(|_| invalid())?;
            verifying_key
                .verify_strict(&message, &DalekSignature::from_bytes(&sig.0))
                .map_err(|_| invalid())?;
        }
        Ok(())
    }

    /// The network identifies a transaction by its first signature.
    pub fn id(&self) -> Option<TransactionId> {
        self.signatures
            .first()
            .filter(|s| !s.is_empty())
            .map(|s| TransactionId::from(*s))
    }
}

/// Append `value` as a compact-u16 (1 to 3 bytes, 7 bits per byte).
pub fn encode_compact_u16(value: u16, out: &mut Vec<u8>) {
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

/// Decode a canonical compact-u16, returning the value and bytes consumed.
pub fn decode_compact_u16(bytes: &[u8]) -> Option<(u16, usize)> {
    let mut value: u32 = 0;
    for i in 0..3 {
        let byte = *bytes.get(i)?;
        // Third byte may only carry the top two bits
        if i == 2 && byte > 0x03 {
            return None;
        }
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            // Reject zero continuation bytes: a shorter encoding exists
            if i > 0 && byte == 0 {
                return None;
            }
            return Some((value as u16, i + 1));
        }
    }
    None
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Truncated(self.pos));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn compact_u16(&mut self) -> Result<u16, WireError> {
        let start = self.pos;
        let (value, used) = decode_compact_u16(&self.bytes[self.pos..]).ok_or_else(|| {
            if self.remaining() < 3 && self.bytes[self.pos..].iter().all(|b| b & 0x80 != 0) {
                WireError::Truncated(start)
            } else {
                WireError::InvalidCompactU16(start)
            }
        })?;
        self.pos += used;
        Ok(value)
    }
}
