//! Prompt Generator (§4.4): selects a Turn-2 template by verification
//! type, renders it, and produces a `templateProcessor` record.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::time::Instant;
use turn2_core::{Turn1Artifact, VerificationContext, VerificationType};

/// Identifies one Turn-2 prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    /// `turn2-layout-vs-checking`.
    LayoutVsChecking,
    /// `turn2-previous-vs-current`.
    PreviousVsCurrent,
    /// `turn2-default`, used when the verification type is unrecognised.
    Default,
}

impl TemplateId {
    /// Select a template id for the given verification type (§4.4).
    #[must_use]
    pub fn select(vtype: VerificationType) -> Self {
        match vtype {
            VerificationType::LayoutVsChecking => Self::LayoutVsChecking,
            VerificationType::PreviousVsCurrent => Self::PreviousVsCurrent,
        }
    }

    /// Stable string identifier, as recorded in `templateProcessor.templateId`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LayoutVsChecking => "turn2-layout-vs-checking",
            Self::PreviousVsCurrent => "turn2-previous-vs-current",
            Self::Default => "turn2-default",
        }
    }
}

/// Record produced alongside the rendered prompt (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateProcessor {
    /// Template id used.
    pub template_id: String,
    /// Template version, from configuration.
    pub version: String,
    /// The rendered prompt content.
    pub rendered_content: String,
    /// Wall-clock render time.
    pub render_time_ms: u64,
}

/// Minimal template registry: one fixed template body per [`TemplateId`],
/// in the spirit of the dialect-keyed lookup tables this workspace favors
/// over a generic plugin system.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    version: String,
}

impl TemplateRegistry {
    /// Build a registry stamped with the configured template version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Render the template selected for `verification_context.verification_type`
    /// against the verification context, system prompt, and Turn-1 response.
    pub fn render(
        &self,
        verification_context: &VerificationContext,
        system_prompt: &str,
        turn1: &Turn1Artifact,
    ) -> (String, TemplateProcessor) {
        let start = Instant::now();
        let template_id = TemplateId::select(verification_context.verification_type);
        let rendered = self.body(template_id, verification_context, system_prompt, turn1);
        let elapsed = start.elapsed();
        tracing::debug!(
            target: "turn2.templates",
            template_id = template_id.as_str(),
            verification_id = %verification_context.verification_id,
            "rendered turn-2 prompt"
        );
        (
            rendered.clone(),
            TemplateProcessor {
                template_id: template_id.as_str().to_string(),
                version: self.version.clone(),
                rendered_content: rendered,
                render_time_ms: elapsed.as_millis() as u64,
            },
        )
    }

    fn body(
        &self,
        template_id: TemplateId,
        ctx: &VerificationContext,
        system_prompt: &str,
        turn1: &Turn1Artifact,
    ) -> String {
        let intro = match template_id {
            TemplateId::LayoutVsChecking => {
                "Compare the checking image against the reference layout."
            }
            TemplateId::PreviousVsCurrent => {
                "Compare the checking image against the previous checking image."
            }
            TemplateId::Default => "Compare the checking image against the prior analysis.",
        };
        format!(
            "{intro}\n\nVerification: {}\nSystem context: {}\nPrior analysis: {}",
            ctx.verification_id, system_prompt, turn1.response.content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turn2_core::Turn1Response;

    fn sample_context(vtype: VerificationType) -> VerificationContext {
        VerificationContext {
            verification_id: "verif-1".into(),
            verification_at: "2025-06-01T12:00:00Z".into(),
            verification_type: vtype,
            vending_machine_id: None,
            layout_id: None,
            layout_prefix: None,
            status: None,
        }
    }

    fn sample_turn1() -> Turn1Artifact {
        Turn1Artifact {
            turn_id: 1,
            prompt: "Analyze the reference image".into(),
            response: Turn1Response {
                content: "All slots filled correctly".into(),
                thinking: None,
            },
            token_usage: None,
            bedrock_metadata: None,
        }
    }

    #[test]
    fn selects_layout_vs_checking_template() {
        assert_eq!(
            TemplateId::select(VerificationType::LayoutVsChecking),
            TemplateId::LayoutVsChecking
        );
    }

    #[test]
    fn selects_previous_vs_current_template() {
        assert_eq!(
            TemplateId::select(VerificationType::PreviousVsCurrent),
            TemplateId::PreviousVsCurrent
        );
    }

    #[test]
    fn template_ids_have_stable_strings() {
        assert_eq!(TemplateId::LayoutVsChecking.as_str(), "turn2-layout-vs-checking");
        assert_eq!(TemplateId::Default.as_str(), "turn2-default");
    }

    #[test]
    fn render_includes_verification_id_and_prior_analysis() {
        let registry = TemplateRegistry::new("1.0.0");
        let ctx = sample_context(VerificationType::LayoutVsChecking);
        let (rendered, processor) =
            registry.render(&ctx, "system context text", &sample_turn1());
        assert!(rendered.contains("verif-1"));
        assert!(rendered.contains("All slots filled correctly"));
        assert_eq!(processor.template_id, "turn2-layout-vs-checking");
        assert_eq!(processor.version, "1.0.0");
        assert_eq!(processor.rendered_content, rendered);
    }
}
