//! Grounding prompt builder.
//!
//! The prompt binds the document as the only source, repeats the question and
//! tells the model to answer with a fixed refusal sentence when the document
//! has no answer. Callers compare answers against [`PromptLanguage::refusal`]
//! to tell "not in the document" apart from a failure.

use std::str::FromStr;

use crate::{document_store::is_present, error::QaError};

/// Refusal sentence for English deployments.
pub const REFUSAL_EN: &str = "I don't know based on the information provided.";

/// Refusal sentence for Portuguese deployments.
pub const REFUSAL_PT: &str = "Não sei com base nas informações fornecidas.";

/// Working language of the prompt and of the refusal sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptLanguage {
    #[default]
    English,
    Portuguese,
}

impl PromptLanguage {
    /// The exact sentence the model must emit when the document lacks the answer.
    pub fn refusal(self) -> &'static str {
        match self {
            PromptLanguage::English => REFUSAL_EN,
            PromptLanguage::Portuguese => REFUSAL_PT,
        }
    }

    fn template(self) -> Template {
        match self {
            PromptLanguage::English => Template {
                intro: "Based on the following text, which is the only source you may use:",
                question: "Answer the question:",
                rule: "Answer only if the answer is in the text provided, using only facts \
                       stated in it. If the answer is not in the text, reply exactly:",
            },
            PromptLanguage::Portuguese => Template {
                intro: "Baseado no texto:",
                question: "Responda a pergunta:",
                rule: "Responda apenas se a resposta estiver no texto fornecido. \
                       Se a resposta não estiver no texto, responda",
            },
        }
    }
}

impl FromStr for PromptLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(PromptLanguage::English),
            "pt" | "pt-br" | "portuguese" => Ok(PromptLanguage::Portuguese),
            other => Err(format!("unsupported prompt language: {other}")),
        }
    }
}

struct Template {
    intro: &'static str,
    question: &'static str,
    rule: &'static str,
}

/// Stateless builder for a given working language.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    language: PromptLanguage,
}

impl PromptBuilder {
    pub fn new(language: PromptLanguage) -> Self {
        Self { language }
    }

    pub fn language(&self) -> PromptLanguage {
        self.language
    }

    /// Builds the grounded prompt.
    ///
    /// The document and question are embedded verbatim, in that order, after
    /// the introduction and before the grounding rule.
    ///
    /// # Errors
    /// [`QaError::InvalidInput`] if either input is blank after trimming.
    ///
    /// # Example
    /// ```
    /// use grounded_qa::prompt::{PromptBuilder, REFUSAL_EN};
    ///
    /// let p = PromptBuilder::default()
    ///     .build("The sky is blue.", "What color is the sky?")
    ///     .unwrap();
    /// assert!(p.contains("The sky is blue."));
    /// assert!(p.contains(REFUSAL_EN));
    /// ```
    pub fn build(&self, document: &str, question: &str) -> Result<String, QaError> {
        if !is_present(document) {
            return Err(QaError::InvalidInput("document must not be empty"));
        }
        if question.trim().is_empty() {
            return Err(QaError::InvalidInput("question must not be empty"));
        }

        let t = self.language.template();
        let refusal = self.language.refusal();

        let mut out = String::with_capacity(
            document.len() + question.len() + t.intro.len() + t.rule.len() + refusal.len() + 64,
        );
        out.push_str(t.intro);
        out.push_str("\n\n");
        out.push_str(document);
        out.push_str("\n\n");
        out.push_str(t.question);
        out.push(' ');
        out.push_str(question);
        out.push_str("\n\n");
        out.push_str(t.rule);
        out.push_str(" \"");
        out.push_str(refusal);
        out.push('"');
        Ok(out)
    }
}

/// Builds an English grounded prompt. See [`PromptBuilder::build`].
pub fn build_prompt(document: &str, question: &str) -> Result<String, QaError> {
    PromptBuilder::default().build(document, question)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_inputs_verbatim_in_order() {
        let doc = "  The sky is blue.\nGrass is green.  ";
        let q = "What color is the sky?";
        let p = build_prompt(doc, q).unwrap();

        let doc_at = p.find(doc).expect("document verbatim");
        let q_at = p.find(q).expect("question verbatim");
        let refusal_at = p.find(REFUSAL_EN).expect("refusal sentence");
        assert!(doc_at < q_at && q_at < refusal_at);
        assert!(p.starts_with("Based on the following text"));
    }

    #[test]
    fn is_deterministic() {
        let a = build_prompt("doc", "q?").unwrap();
        let b = build_prompt("doc", "q?").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn blank_inputs_are_invalid() {
        assert!(matches!(build_prompt("", "q"), Err(QaError::InvalidInput(_))));
        assert!(matches!(build_prompt("  \n", "q"), Err(QaError::InvalidInput(_))));
        assert!(matches!(build_prompt("doc", ""), Err(QaError::InvalidInput(_))));
        assert!(matches!(build_prompt("doc", "\t"), Err(QaError::InvalidInput(_))));
    }

    #[test]
    fn portuguese_uses_its_refusal() {
        let p = PromptBuilder::new(PromptLanguage::Portuguese)
            .build("O céu é azul.", "Qual a cor do céu?")
            .unwrap();
        assert!(p.starts_with("Baseado no texto:"));
        assert!(p.contains("Responda a pergunta: Qual a cor do céu?"));
        assert!(p.ends_with("\"Não sei com base nas informações fornecidas.\""));
        assert!(!p.contains(REFUSAL_EN));
    }

    #[test]
    fn language_parsing() {
        assert_eq!("EN".parse::<PromptLanguage>().unwrap(), PromptLanguage::English);
        assert_eq!("pt-BR".parse::<PromptLanguage>().unwrap(), PromptLanguage::Portuguese);
        assert!("fr".parse::<PromptLanguage>().is_err());
    }
}
