//! Text normalization helpers shared by slugs and report rendering.

/// Folds common Latin accented characters to their ASCII base letter and
/// drops anything still outside ASCII. Used for slugs and for the PDF
/// renderer, whose content streams are Latin-1 text.
#[must_use]
pub fn normalize_ascii(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for character in value.chars() {
        match fold_accent(character) {
            Some(folded) => output.push(folded),
            None => {
                if character.is_ascii() {
                    output.push(character);
                }
            }
        }
    }
    output
}

/// Lowercase URL-safe token: accents folded, alphanumeric runs joined by `-`.
/// Returns an empty string when nothing usable remains.
#[must_use]
pub fn slugify(value: &str) -> String {
    let normalized = normalize_ascii(value).to_lowercase();
    let mut slug = String::with_capacity(normalized.len());
    let mut previous_was_separator = true;
    for character in normalized.chars() {
        if character.is_ascii_alphanumeric() {
            slug.push(character);
            previous_was_separator = false;
        } else if !previous_was_separator {
            slug.push('-');
            previous_was_separator = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

const fn fold_accent(character: char) -> Option<char> {
    Some(match character {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ascii_folds_accents() {
        assert_eq!(normalize_ascii("Cartão de crédito"), "Cartao de credito");
        assert_eq!(normalize_ascii("Divída é paga"), "Divida e paga");
    }

    #[test]
    fn normalize_ascii_drops_unmapped_characters() {
        assert_eq!(normalize_ascii("R$ 10 — ok"), "R$ 10  ok");
    }

    #[test]
    fn slugify_produces_url_safe_tokens() {
        assert_eq!(slugify("Cartão de Crédito"), "cartao-de-credito");
        assert_eq!(slugify("Itaú"), "itau");
        assert_eq!(slugify("  both  "), "both");
        assert_eq!(slugify("!!!"), "");
    }
}
