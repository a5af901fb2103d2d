//! Prompt construction for car biographies.

use crate::error::AiError;

/// Character limit requested in the prompt. Not enforced on the reply.
pub const MAX_BIO_CHARS: usize = 250;

/// Default biography prompt (Brazilian Portuguese, as the storefront is).
///
/// Placeholders: `{model}`, `{brand}`, `{year}`, `{max_chars}`.
pub const DEFAULT_BIO_TEMPLATE: &str = "Me de uma descrição sobre o carro {model} da marca {brand} do ano {year}, de no máximo {max_chars} caractéres. Fale especificamente sobre esse carro";

const REQUIRED_PLACEHOLDERS: [&str; 3] = ["{model}", "{brand}", "{year}"];

/// Validated prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioPromptTemplate(String);

impl BioPromptTemplate {
    /// Accepts a template only if it mentions model, brand and year.
    pub fn new(template: impl Into<String>) -> Result<Self, AiError> {
        let template = template.into();
        let missing: Vec<&str> = REQUIRED_PLACEHOLDERS
            .iter()
            .copied()
            .filter(|p| !template.contains(p))
            .collect();
        if !missing.is_empty() {
            return Err(AiError::InvalidInput(format!(
                "bio prompt template is missing placeholder(s): {}",
                missing.join(", ")
            )));
        }
        Ok(Self(template))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BioPromptTemplate {
    fn default() -> Self {
        Self(DEFAULT_BIO_TEMPLATE.to_string())
    }
}

/// The car attributes a biography prompt embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarBioPrompt<'a> {
    pub model: &'a str,
    pub brand: &'a str,
    pub model_year: i32,
}

impl CarBioPrompt<'_> {
    /// Substitute placeholders in a single pass over the template.
    ///
    /// Inserted values are never rescanned, so a model or brand that itself
    /// contains `{brand}` or `{year}` is embedded verbatim. Unknown `{...}`
    /// sequences are kept as written.
    pub fn render(&self, template: &BioPromptTemplate) -> String {
        let year = self.model_year.to_string();
        let max_chars = MAX_BIO_CHARS.to_string();
        let substitutions = [
            ("{model}", self.model),
            ("{brand}", self.brand),
            ("{year}", year.as_str()),
            ("{max_chars}", max_chars.as_str()),
        ];

        let mut rest = template.as_str();
        let mut out = String::with_capacity(rest.len() + self.model.len() + self.brand.len());
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            match substitutions
                .iter()
                .find(|(placeholder, _)| tail.starts_with(placeholder))
            {
                Some((placeholder, value)) => {
                    out.push_str(value);
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_embeds_all_car_attributes() {
        let prompt = CarBioPrompt {
            model: "Civic",
            brand: "Honda",
            model_year: 2020,
        }
        .render(&BioPromptTemplate::default());

        assert_eq!(
            prompt,
            "Me de uma descrição sobre o carro Civic da marca Honda do ano 2020, de no máximo 250 caractéres. Fale especificamente sobre esse carro"
        );
    }

    #[test]
    fn custom_template_is_rendered() {
        let template = BioPromptTemplate::new("Describe the {year} {brand} {model}.").unwrap();
        let prompt = CarBioPrompt {
            model: "Golf",
            brand: "VW",
            model_year: 1999,
        }
        .render(&template);

        assert_eq!(prompt, "Describe the 1999 VW Golf.");
    }

    #[test]
    fn attribute_values_with_placeholder_text_are_embedded_verbatim() {
        let prompt = CarBioPrompt {
            model: "Série {brand}",
            brand: "B{year}MW {max_chars}",
            model_year: 2020,
        }
        .render(&BioPromptTemplate::default());

        assert!(prompt.contains("carro Série {brand} da marca"), "{prompt}");
        assert!(prompt.contains("marca B{year}MW {max_chars} do ano 2020"), "{prompt}");
        assert!(prompt.contains("no máximo 250 caractéres"));
    }

    #[test]
    fn unknown_braces_in_template_are_kept() {
        let template = BioPromptTemplate::new("{model} {brand} {year} {color} {").unwrap();
        let prompt = CarBioPrompt {
            model: "Uno",
            brand: "Fiat",
            model_year: 1990,
        }
        .render(&template);

        assert_eq!(prompt, "Uno Fiat 1990 {color} {");
    }

    #[test]
    fn template_without_year_is_rejected() {
        let err = BioPromptTemplate::new("Describe the {brand} {model}.").unwrap_err();
        match err {
            AiError::InvalidInput(msg) => assert!(msg.contains("{year}")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
