//! Salsa20 variant used for encrypted BLTE chunks
//!
//! BLTE uses 16-byte keys (the "expand 16-byte k" constants) and a 4-byte IV
//! that is zero-extended to the 8-byte nonce. Before use, the first four IV
//! bytes are XORed with the little-endian chunk index so every chunk of a
//! file gets its own keystream.

use crate::error::CryptoError;

const TAU: [u32; 4] = [0x6170_7865, 0x3120_646e, 0x7962_2d36, 0x6b20_6574];

/// Salsa20/20 keystream generator with a 128-bit key
pub struct Salsa20Cipher {
    state: [u32; 16],
    keystream: [u8; 64],
    position: usize,
}

impl Salsa20Cipher {
    /// Create a cipher for one BLTE chunk
    pub fn new(key: &[u8; 16], iv: &[u8], chunk_index: usize) -> Result<Self, CryptoError> {
        let nonce = chunk_nonce(iv, chunk_index)?;
        Ok(Self::with_nonce(key, nonce))
    }

    /// Create a cipher from a ready nonce
    pub fn with_nonce(key: &[u8; 16], nonce: [u8; 8]) -> Self {
        let k = |i: usize| u32::from_le_bytes([key[i], key[i + 1], key[i + 2], key[i + 3]]);
        let n = |i: usize| {
            u32::from_le_bytes([nonce[i], nonce[i + 1], nonce[i + 2], nonce[i + 3]])
        };

        let state = [
            TAU[0],
            k(0),
            k(4),
            k(8),
            k(12),
            TAU[1],
            n(0),
            n(4),
            0,
            0,
            TAU[2],
            k(0),
            k(4),
            k(8),
            k(12),
            TAU[3],
        ];

        Self {
            state,
            keystream: [0; 64],
            position: 64,
        }
    }

    /// XOR the keystream into `data` in place
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data {
            if self.position == 64 {
                self.refill();
            }
            *byte ^= self.keystream[self.position];
            self.position += 1;
        }
    }

    fn refill(&mut self) {
        let mut x = self.state;
        for _ in 0..10 {
            quarter_round(&mut x, 0, 4, 8, 12);
            quarter_round(&mut x, 5, 9, 13, 1);
            quarter_round(&mut x, 10, 14, 2, 6);
            quarter_round(&mut x, 15, 3, 7, 11);
            quarter_round(&mut x, 0, 1, 2, 3);
            quarter_round(&mut x, 5, 6, 7, 4);
            quarter_round(&mut x, 10, 11, 8, 9);
            quarter_round(&mut x, 15, 12, 13, 14);
        }
        for (i, word) in x.iter().enumerate() {
            let out = word.wrapping_add(self.state[i]).to_le_bytes();
            self.keystream[i * 4..i * 4 + 4].copy_from_slice(&out);
        }

        self.state[8] = self.state[8].wrapping_add(1);
        if self.state[8] == 0 {
            self.state[9] = self.state[9].wrapping_add(1);
        }
        self.position = 0;
    }
}

fn quarter_round(s: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    s[b] ^= s[a].wrapping_add(s[d]).rotate_left(7);
    s[c] ^= s[b].wrapping_add(s[a]).rotate_left(9);
    s[d] ^= s[c].wrapping_add(s[b]).rotate_left(13);
    s[a] ^= s[d].wrapping_add(s[c]).rotate_left(18);
}

/// Derive the per-chunk nonce from a 4-byte IV
pub fn chunk_nonce(iv: &[u8], chunk_index: usize) -> Result<[u8; 8], CryptoError> {
    if iv.len() != 4 {
        return Err(CryptoError::InvalidIvSize {
            expected: 4,
            actual: iv.len(),
        });
    }

    let mut nonce = [0u8; 8];
    nonce[..4].copy_from_slice(iv);
    let index = (chunk_index as u32).to_le_bytes();
    for (byte, mask) in nonce.iter_mut().zip(index) {
        *byte ^= mask;
    }
    Ok(nonce)
}

/// Decrypt one chunk payload into a new buffer
pub fn decrypt_salsa20(
    data: &[u8],
    key: &[u8; 16],
    iv: &[u8],
    chunk_index: usize,
) -> Result<Vec<u8>, CryptoError> {
    let mut cipher = Salsa20Cipher::new(key, iv, chunk_index)?;
    let mut output = data.to_vec();
    cipher.apply_keystream(&mut output);
    Ok(output)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ecrypt_128bit_vector() {
        // ECRYPT Salsa20/20 set 1, vector 0: key 80 00.., nonce 0
        let mut key = [0u8; 16];
        key[0] = 0x80;
        let mut cipher = Salsa20Cipher::with_nonce(&key, [0u8; 8]);
        let mut stream = [0u8; 16];
        cipher.apply_keystream(&mut stream);
        assert_eq!(hex::encode_upper(stream), "4DFA5E481DA23EA09A31022050859936");
    }

    #[test]
    fn test_chunk_index_changes_nonce() {
        let iv = [0x11, 0x22, 0x33, 0x44];
        assert_eq!(
            chunk_nonce(&iv, 0).unwrap(),
            [0x11, 0x22, 0x33, 0x44, 0, 0, 0, 0]
        );
        assert_eq!(
            chunk_nonce(&iv, 0x0102).unwrap(),
            [0x13, 0x23, 0x33, 0x44, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_invalid_iv_size() {
        let result = decrypt_salsa20(b"data", &[1u8; 16], &[1, 2], 0);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidIvSize {
                expected: 4,
                actual: 2
            })
        ));
    }

    proptest! {
        #[test]
        fn keystream_is_an_involution(
            data in prop::collection::vec(any::<u8>(), 0..300),
            key in prop::array::uniform16(any::<u8>()),
            index in 0usize..64,
        ) {
            let iv = [9, 8, 7, 6];
            let once = decrypt_salsa20(&data, &key, &iv, index).unwrap();
            let twice = decrypt_salsa20(&once, &key, &iv, index).unwrap();
            prop_assert_eq!(twice, data);
        }
    }
}
