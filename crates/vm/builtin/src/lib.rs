// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! Standard built-in contracts (precompiles).
//!
//! Each builtin is a pair of a gas pricer and an implementation. The
//! orchestrator (`executive` crate) looks one up by address, charges
//! `pricer.cost(input)` up front, and only then calls `execute`. These
//! address-to-handler contracts are not themselves the subject of the
//! interpreter specification; they exist so a full transaction can run
//! end to end without a second, external precompile crate.

extern crate byteorder;
extern crate ethereum_types;
extern crate keccak_hash as hash;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_bigint;
extern crate parity_bytes as bytes;
extern crate ripemd;
extern crate secp256k1;
extern crate sha2;
extern crate substrate_bn as bn;

use std::{
    cmp::{max, min},
    collections::BTreeMap,
};

use bytes::BytesRef;
use ethereum_types::{Address, U256};
use num::Zero;
use num_bigint::BigUint;

/// Gas cost of running a builtin, as a function of its input.
pub trait Pricer: Send + Sync {
    /// The gas cost of running this precompile against the given input.
    fn cost(&self, input: &[u8]) -> U256;
}

/// A linear pricer, `base + word * ceil(len / 32)`.
#[derive(Debug)]
pub struct Linear {
    base: usize,
    word: usize,
}

impl Linear {
    /// Construct a new linear pricer.
    pub fn new(base: usize, word: usize) -> Linear {
        Linear { base, word }
    }
}

impl Pricer for Linear {
    fn cost(&self, input: &[u8]) -> U256 {
        let word_count = (input.len() + 31) / 32;
        U256::from(self.base) + U256::from(self.word) * U256::from(word_count)
    }
}

/// A pricer for the BN128 pairing check: a flat base plus a per-pair
/// cost, where one "pair" is a 192-byte `(G1, G2)` tuple.
#[derive(Debug)]
pub struct Bn128Pairing {
    pub base: usize,
    pub pair: usize,
}

impl Pricer for Bn128Pairing {
    fn cost(&self, input: &[u8]) -> U256 {
        let pairs = input.len() / 192;
        U256::from(self.base) + U256::from(self.pair) * U256::from(pairs)
    }
}

/// Reads a big-endian, zero-extended 32-byte length field at `offset`,
/// truncated to `usize` (inputs this large would never fit in memory
/// or gas anyway, so silent truncation can't under-price a real call).
fn read_length(input: &[u8], offset: usize) -> usize {
    let mut buf = [0u8; 32];
    let start = offset.min(input.len());
    let end = (offset + 32).min(input.len());
    if end > start {
        buf[..end - start].copy_from_slice(&input[start..end]);
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&buf[24..]);
    u64::from_be_bytes(tail) as usize
}

/// Reads a zero-padded `len`-byte big-endian slice at `offset`.
fn read_padded(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    let start = offset.min(input.len());
    let end = (offset + len).min(input.len());
    if end > start {
        bytes[..end - start].copy_from_slice(&input[start..end]);
    }
    bytes
}

/// EIP-198/EIP-2565 `MODEXP` pricer.
#[derive(Debug)]
pub struct ModexpPricer {
    /// Minimum gas charged regardless of input shape.
    pub minimum: usize,
}

impl Pricer for ModexpPricer {
    fn cost(&self, input: &[u8]) -> U256 {
        let base_len = read_length(input, 0);
        let exp_len = read_length(input, 32);
        let mod_len = read_length(input, 64);

        if mod_len == 0 && base_len == 0 {
            return U256::from(self.minimum);
        }

        let max_len = max(mod_len, base_len);
        let words = (max_len + 7) / 8;
        let multiplication_complexity = U256::from(words) * U256::from(words);

        let exp_head = {
            let head = read_padded(input, 96 + base_len, min(exp_len, 32));
            U256::from_big_endian(&head)
        };
        let iteration_count: u64 = if exp_len <= 32 {
            if exp_head.is_zero() {
                0
            } else {
                exp_head.bits().saturating_sub(1) as u64
            }
        } else {
            let high_bits = if exp_head.is_zero() { 0 } else { exp_head.bits().saturating_sub(1) as u64 };
            8 * (exp_len as u64 - 32) + high_bits
        };

        let gas = multiplication_complexity * U256::from(max(iteration_count, 1)) / U256::from(3u64);
        U256::from(max(gas.low_u64() as usize, self.minimum))
    }
}

/// A precompile's actual computation.
pub trait Implementation: Send + Sync {
    /// Run this precompile against `input`, writing its result to `output`.
    /// Returning `Err` does not revert the calling frame's state; the
    /// caller (the orchestrator) converts it into a zero result word.
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str>;
}

/// A complete built-in contract: a pricer and an implementation bundled
/// under a human-readable name for diagnostics.
pub struct Builtin {
    pricer: Box<dyn Pricer>,
    native: Box<dyn Implementation>,
    name: &'static str,
}

impl Builtin {
    /// Gas cost of running this builtin on `input`.
    pub fn cost(&self, input: &[u8]) -> U256 {
        self.pricer.cost(input)
    }

    /// Execute this builtin against `input`, writing into `output`.
    pub fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        self.native.execute(input, output)
    }

    /// Human-readable name, for tracing/diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

struct Identity;

impl Implementation for Identity {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        output.write(0, input);
        Ok(())
    }
}

struct EcRecover;

impl Implementation for EcRecover {
    fn execute(&self, i: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        let input = read_padded(i, 0, 128);

        let hash = &input[0..32];
        let v = &input[32..64];
        let r = &input[64..96];
        let s = &input[96..128];

        let recovery_id = match v[31] {
            27 => 0,
            28 => 1,
            _ => {
                trace!(target: "builtin", "ecrecover: bad recovery id");
                return Ok(());
            }
        };
        if !v[..31].iter().all(|&b| b == 0) {
            return Ok(());
        }

        let recovery_id = match secp256k1::ecdsa::RecoveryId::from_i32(recovery_id) {
            Ok(r) => r,
            Err(_) => return Ok(()),
        };

        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(r);
        sig_bytes[32..].copy_from_slice(s);
        let sig = match secp256k1::ecdsa::RecoverableSignature::from_compact(&sig_bytes, recovery_id) {
            Ok(s) => s,
            Err(_) => return Ok(()),
        };
        let message = match secp256k1::Message::from_digest_slice(hash) {
            Ok(m) => m,
            Err(_) => return Ok(()),
        };

        match secp256k1::SECP256K1.recover_ecdsa(&message, &sig) {
            Ok(public) => {
                let serialized = public.serialize_uncompressed();
                // drop the leading 0x04 prefix before hashing the 64-byte point.
                let hashed = hash::keccak(&serialized[1..]);
                let mut result = [0u8; 32];
                result[12..].copy_from_slice(&hashed[12..]);
                output.write(0, &result);
            }
            Err(_) => trace!(target: "builtin", "ecrecover: signature did not recover"),
        }
        Ok(())
    }
}

struct Sha256;

impl Implementation for Sha256 {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        use sha2::Digest;
        let digest = sha2::Sha256::digest(input);
        output.write(0, &digest);
        Ok(())
    }
}

struct Ripemd160;

impl Implementation for Ripemd160 {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        use ripemd::Digest;
        let digest = ripemd::Ripemd160::digest(input);
        let mut padded = [0u8; 32];
        padded[12..].copy_from_slice(&digest);
        output.write(0, &padded);
        Ok(())
    }
}

struct ModexpImpl;

impl Implementation for ModexpImpl {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        let base_len = read_length(input, 0);
        let exp_len = read_length(input, 32);
        let mod_len = read_length(input, 64);

        if mod_len == 0 {
            return Ok(());
        }

        let base = BigUint::from_bytes_be(&read_padded(input, 96, base_len));
        let exponent = BigUint::from_bytes_be(&read_padded(input, 96 + base_len, exp_len));
        let modulus = BigUint::from_bytes_be(&read_padded(input, 96 + base_len + exp_len, mod_len));

        let result = if modulus.is_zero() {
            BigUint::zero()
        } else {
            base.modpow(&exponent, &modulus)
        };

        let mut out = result.to_bytes_be();
        if out.len() < mod_len {
            let mut padded = vec![0u8; mod_len - out.len()];
            padded.append(&mut out);
            out = padded;
        } else if out.len() > mod_len {
            out = out[out.len() - mod_len..].to_vec();
        }
        output.write(0, &out);
        Ok(())
    }
}

fn read_fr(input: &[u8], offset: usize) -> Result<bn::Fr, &'static str> {
    bn::Fr::from_slice(&read_padded(input, offset, 32)).map_err(|_| "invalid field element")
}

fn read_fq(input: &[u8], offset: usize) -> Result<bn::Fq, &'static str> {
    bn::Fq::from_slice(&read_padded(input, offset, 32)).map_err(|_| "invalid field element")
}

fn read_g1(input: &[u8], offset: usize) -> Result<bn::G1, &'static str> {
    use bn::{AffineG1, Group, G1};

    let px = read_fq(input, offset)?;
    let py = read_fq(input, offset + 32)?;

    if px.is_zero() && py.is_zero() {
        Ok(G1::zero())
    } else {
        AffineG1::new(px, py).map(Into::into).map_err(|_| "point not on curve")
    }
}

struct Bn128Add;

impl Implementation for Bn128Add {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        use bn::AffineG1;

        let p1 = read_g1(input, 0)?;
        let p2 = read_g1(input, 64)?;

        let mut write_buf = [0u8; 64];
        if let Some(sum) = AffineG1::from_jacobian(p1 + p2) {
            sum.x().to_big_endian(&mut write_buf[0..32]).map_err(|_| "field encode failed")?;
            sum.y().to_big_endian(&mut write_buf[32..64]).map_err(|_| "field encode failed")?;
        }
        output.write(0, &write_buf);
        Ok(())
    }
}

struct Bn128Mul;

impl Implementation for Bn128Mul {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        use bn::AffineG1;

        let p = read_g1(input, 0)?;
        let fr = read_fr(input, 64)?;

        let mut write_buf = [0u8; 64];
        if let Some(product) = AffineG1::from_jacobian(p * fr) {
            product.x().to_big_endian(&mut write_buf[0..32]).map_err(|_| "field encode failed")?;
            product.y().to_big_endian(&mut write_buf[32..64]).map_err(|_| "field encode failed")?;
        }
        output.write(0, &write_buf);
        Ok(())
    }
}

struct Bn128PairingImpl;

impl Implementation for Bn128PairingImpl {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        use bn::{pairing_batch, AffineG1, AffineG2, Fq2, Group, Gt, G1, G2};

        if input.len() % 192 != 0 {
            return Err("invalid input length, must be multiple of 192 bytes");
        }

        let mut pairs = Vec::with_capacity(input.len() / 192);
        for chunk in input.chunks(192) {
            let g1 = read_g1(chunk, 0)?;

            let bay = read_fq(chunk, 64)?;
            let bax = read_fq(chunk, 96)?;
            let bby = read_fq(chunk, 128)?;
            let bbx = read_fq(chunk, 160)?;
            let ba = Fq2::new(bax, bay);
            let bb = Fq2::new(bbx, bby);
            let g2 = if ba.is_zero() && bb.is_zero() {
                G2::zero()
            } else {
                AffineG2::new(ba, bb).map(Into::into).map_err(|_| "g2 point not on curve")?
            };

            pairs.push((g1, g2));
        }

        let success = pairing_batch(&pairs) == Gt::one();
        let mut result = [0u8; 32];
        if success {
            result[31] = 1;
        }
        output.write(0, &result);
        Ok(())
    }
}

struct Blake2F;

impl Implementation for Blake2F {
    fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), &'static str> {
        const BLAKE2_F_ARG_LEN: usize = 213;
        if input.len() != BLAKE2_F_ARG_LEN {
            return Err("input length for Blake2 F precompile should be exactly 213 bytes");
        }

        let mut rounds = [0u8; 4];
        rounds.copy_from_slice(&input[0..4]);
        let rounds = u32::from_be_bytes(rounds) as usize;

        let f = match input[212] {
            0 => false,
            1 => true,
            _ => return Err("incorrect final block indicator flag"),
        };

        let mut h = [0u64; 8];
        for (i, slot) in h.iter_mut().enumerate() {
            let mut b = [0u8; 8];
            b.copy_from_slice(&input[4 + i * 8..12 + i * 8]);
            *slot = u64::from_le_bytes(b);
        }

        let mut m = [0u64; 16];
        for (i, slot) in m.iter_mut().enumerate() {
            let mut b = [0u8; 8];
            b.copy_from_slice(&input[68 + i * 8..76 + i * 8]);
            *slot = u64::from_le_bytes(b);
        }

        let mut t = [0u64; 2];
        for (i, slot) in t.iter_mut().enumerate() {
            let mut b = [0u8; 8];
            b.copy_from_slice(&input[196 + i * 8..204 + i * 8]);
            *slot = u64::from_le_bytes(b);
        }

        eip_152::compress(&mut h, m, t, f, rounds);

        let mut out = [0u8; 64];
        for (i, word) in h.iter().enumerate() {
            out[i * 8..i * 8 + 8].copy_from_slice(&word.to_le_bytes());
        }
        output.write(0, &out);
        Ok(())
    }
}

fn make(name: &'static str, pricer: Box<dyn Pricer>, native: Box<dyn Implementation>) -> Builtin {
    Builtin { pricer, native, name }
}

/// Build the table of standard builtins, addressed 0x01..0x09. Every
/// entry here matches the gas model and name in the component design
/// table; fork-gating which addresses are actually reachable for a
/// given `Schedule` is the orchestrator's job (`executive::precompiled`),
/// not this crate's.
pub fn standard_builtins() -> BTreeMap<Address, Builtin> {
    let mut map = BTreeMap::new();
    let addr = |n: u64| Address::from_low_u64_be(n);

    map.insert(addr(1), make("ecrecover", Box::new(Linear::new(3000, 0)), Box::new(EcRecover)));
    map.insert(addr(2), make("sha256", Box::new(Linear::new(60, 12)), Box::new(Sha256)));
    map.insert(addr(3), make("ripemd160", Box::new(Linear::new(600, 120)), Box::new(Ripemd160)));
    map.insert(addr(4), make("identity", Box::new(Linear::new(15, 3)), Box::new(Identity)));
    map.insert(addr(5), make("modexp", Box::new(ModexpPricer { minimum: 200 }), Box::new(ModexpImpl)));
    map.insert(addr(6), make("bn128_add", Box::new(Linear::new(150, 0)), Box::new(Bn128Add)));
    map.insert(addr(7), make("bn128_mul", Box::new(Linear::new(6000, 0)), Box::new(Bn128Mul)));
    map.insert(addr(8), make("bn128_pairing", Box::new(Bn128Pairing { base: 45000, pair: 34000 }), Box::new(Bn128PairingImpl)));
    map.insert(addr(9), make("blake2_f", Box::new(Linear::new(0, 0)), Box::new(Blake2F)));

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hex::FromHex;

    fn run(addr: u64, input: &[u8], out_len: usize) -> Vec<u8> {
        let builtins = standard_builtins();
        let b = &builtins[&Address::from_low_u64_be(addr)];
        let mut out = vec![0u8; out_len];
        b.execute(input, &mut BytesRef::Fixed(&mut out)).unwrap();
        out
    }

    #[test]
    fn identity_echoes_input() {
        assert_eq!(run(4, &[1, 2, 3], 3), vec![1, 2, 3]);
    }

    #[test]
    fn sha256_of_empty_input() {
        let expected: Vec<u8> =
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85".from_hex().unwrap();
        assert_eq!(run(2, &[], 32), expected);
    }

    #[test]
    fn ripemd160_left_pads_to_32_bytes() {
        let out = run(3, b"hello", 32);
        assert_eq!(&out[..12], &[0u8; 12]);
    }

    #[test]
    fn identity_pricer_charges_per_word() {
        let builtins = standard_builtins();
        let identity = &builtins[&Address::from_low_u64_be(4)];
        assert_eq!(identity.cost(&[]), U256::from(15));
        assert_eq!(identity.cost(&[0; 1]), U256::from(18));
        assert_eq!(identity.cost(&[0; 32]), U256::from(18));
        assert_eq!(identity.cost(&[0; 33]), U256::from(21));
    }

    #[test]
    fn modexp_zero_modulus_returns_empty_output() {
        // base_len=1, exp_len=1, mod_len=0
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        let out = run(5, &input, 0);
        assert!(out.is_empty());
    }
}
