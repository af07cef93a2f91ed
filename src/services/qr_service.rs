use rand::Rng;

use crate::{
    error::{AppError, Result},
    models::NewProductUnit,
};

const SERIAL_KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SERIAL_KEY_LENGTH: usize = 12;

const QR_TOKEN_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const QR_TOKEN_LENGTH: usize = 32;

pub const MAX_BATCH_QUANTITY: i64 = 100_000;

fn random_string(alphabet: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// Human-readable serial printed on the sticker. Uniqueness is enforced
/// by the database, not here.
pub fn generate_serial_key() -> String {
    random_string(SERIAL_KEY_ALPHABET, SERIAL_KEY_LENGTH)
}

/// Opaque token embedded in the activation URL. This is the only
/// credential for the public activation flow, so it comes from a CSPRNG.
pub fn generate_qr_token() -> String {
    random_string(QR_TOKEN_ALPHABET, QR_TOKEN_LENGTH)
}

pub fn activation_url(public_url: &str, token: &str) -> String {
    format!("{}/product/{}", public_url.trim_end_matches('/'), token)
}

/// URL of the externally rendered QR image shown in web previews.
/// The rendering service is a black box; the PDF pipeline renders
/// its own QR matrices locally.
pub fn qr_code_url(public_url: &str, token: &str) -> String {
    format!(
        "https://api.qrserver.com/v1/create-qr-code/?size=150x150&data={}",
        urlencoding::encode(&activation_url(public_url, token))
    )
}

/// Expands a batch into `quantity` unsaved units with fresh identifier
/// pairs. Pure apart from randomness; persistence happens one layer up.
pub fn generate_units(
    product_id: i32,
    batch_id: i32,
    quantity: i64,
    public_url: &str,
) -> Result<Vec<NewProductUnit>> {
    if quantity <= 0 || quantity > MAX_BATCH_QUANTITY {
        return Err(AppError::InvalidQuantity(quantity));
    }

    let units = (0..quantity)
        .map(|_| {
            let qr_token = generate_qr_token();
            NewProductUnit {
                product_id,
                batch_id,
                serial_key: generate_serial_key(),
                qr_code_url: qr_code_url(public_url, &qr_token),
                qr_token,
            }
        })
        .collect();

    Ok(units)
}

/// Replaces both identifiers after a unique-constraint collision.
pub fn regenerate_identifiers(unit: &mut NewProductUnit, public_url: &str) {
    unit.serial_key = generate_serial_key();
    unit.qr_token = generate_qr_token();
    unit.qr_code_url = qr_code_url(public_url, &unit.qr_token);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn serial_key_is_twelve_uppercase_alphanumerics() {
        for _ in 0..100 {
            let key = generate_serial_key();
            assert_eq!(key.len(), 12);
            assert!(key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn qr_token_is_thirty_two_alphanumerics() {
        for _ in 0..100 {
            let token = generate_qr_token();
            assert_eq!(token.len(), 32);
            assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn generate_units_returns_exactly_n_distinct_units() {
        let units = generate_units(1, 2, 500, "https://warranty.example.com").unwrap();
        assert_eq!(units.len(), 500);

        let serials: HashSet<_> = units.iter().map(|u| u.serial_key.clone()).collect();
        let tokens: HashSet<_> = units.iter().map(|u| u.qr_token.clone()).collect();
        assert_eq!(serials.len(), 500);
        assert_eq!(tokens.len(), 500);
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert!(matches!(
            generate_units(1, 2, 0, "https://x"),
            Err(AppError::InvalidQuantity(0))
        ));
        assert!(matches!(
            generate_units(1, 2, -5, "https://x"),
            Err(AppError::InvalidQuantity(-5))
        ));
        assert!(matches!(
            generate_units(1, 2, MAX_BATCH_QUANTITY + 1, "https://x"),
            Err(AppError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn qr_code_url_embeds_the_activation_link() {
        let url = qr_code_url("https://warranty.example.com/", "abc123");
        assert!(url.starts_with("https://api.qrserver.com/v1/create-qr-code/"));
        assert!(url.contains("warranty.example.com%2Fproduct%2Fabc123"));
    }

    #[test]
    fn regenerating_identifiers_changes_both() {
        let mut unit = generate_units(1, 2, 1, "https://x").unwrap().remove(0);
        let old_serial = unit.serial_key.clone();
        let old_token = unit.qr_token.clone();
        regenerate_identifiers(&mut unit, "https://x");
        // 1 in 36^12 chance of a false failure; acceptable.
        assert_ne!(unit.serial_key, old_serial);
        assert_ne!(unit.qr_token, old_token);
        assert!(unit.qr_code_url.contains(&urlencoding::encode(&format!(
            "https://x/product/{}",
            unit.qr_token
        )).into_owned()));
    }
}
