//! Catalog of summarisation models offered through OpenRouter.
//!
//! The catalog is what the CLI lists with `--list-models`; it is not a
//! whitelist. Any well-formed `vendor/model[:tag]` identifier is accepted so
//! new OpenRouter models work without a release.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Model used when the caller does not choose one.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1:free";

/// One selectable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Models grouped under their vendor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelCategory {
    pub vendor: &'static str,
    pub models: &'static [ModelInfo],
}

pub static MODEL_CATALOG: &[ModelCategory] = &[
    ModelCategory {
        vendor: "DeepSeek",
        models: &[
            ModelInfo {
                id: "deepseek/deepseek-r1:free",
                name: "DeepSeek R1",
                description: "671B parameters (37B active), reasoning model comparable to OpenAI o1.",
            },
            ModelInfo {
                id: "deepseek/deepseek-r1-distill-llama-70b:free",
                name: "DeepSeek R1 Distill Llama",
                description: "R1 distilled into Llama 70B.",
            },
            ModelInfo {
                id: "deepseek/deepseek-r1-distill-qwen-14b:free",
                name: "DeepSeek R1 Distill Qwen 14B",
                description: "R1 distilled into Qwen 14B.",
            },
            ModelInfo {
                id: "deepseek/deepseek-r1-distill-qwen-32b:free",
                name: "DeepSeek R1 Distill Qwen 32B",
                description: "R1 distilled into Qwen 32B.",
            },
            ModelInfo {
                id: "deepseek/deepseek-v3:free",
                name: "DeepSeek V3",
                description: "General chat model with long context handling.",
            },
            ModelInfo {
                id: "deepseek/deepseek-v3-0324:free",
                name: "DeepSeek V3 0324",
                description: "March 2024 refresh of DeepSeek V3.",
            },
            ModelInfo {
                id: "deepseek/deepseek-v3-base:free",
                name: "DeepSeek V3 Base",
                description: "Base (non-chat) DeepSeek V3.",
            },
        ],
    },
    ModelCategory {
        vendor: "Meta Llama",
        models: &[
            ModelInfo {
                id: "meta-llama/llama-4-maverick:free",
                name: "Llama 4 Maverick",
                description: "400B parameters (17B active), multimodal.",
            },
            ModelInfo {
                id: "meta-llama/llama-4-scout:free",
                name: "Llama 4 Scout",
                description: "109B parameters (17B active), deployment-optimised.",
            },
        ],
    },
    ModelCategory {
        vendor: "Mistral",
        models: &[
            ModelInfo {
                id: "mistralai/mistral-7b-instruct:free",
                name: "Mistral 7B Instruct",
                description: "7B instruction-tuned general model.",
            },
            ModelInfo {
                id: "mistralai/devstral-small:free",
                name: "Devstral Small",
                description: "Small Mistral model for lightweight workloads.",
            },
        ],
    },
    ModelCategory {
        vendor: "Google",
        models: &[ModelInfo {
            id: "google/gemma-3n-e4b-it:free",
            name: "Gemma 3N E4B",
            description: "Instruction-tuned Gemma.",
        }],
    },
    ModelCategory {
        vendor: "Microsoft",
        models: &[
            ModelInfo {
                id: "microsoft/phi-4-reasoning:free",
                name: "Phi-4 Reasoning",
                description: "Phi-4 tuned for reasoning.",
            },
            ModelInfo {
                id: "microsoft/phi-4-reasoning-plus:free",
                name: "Phi-4 Reasoning Plus",
                description: "Phi-4 Reasoning with additional RL training.",
            },
        ],
    },
    ModelCategory {
        vendor: "OpenGVLab",
        models: &[
            ModelInfo {
                id: "opengvlab/internvl3-14b:free",
                name: "InternVL3 14B",
                description: "14B general model.",
            },
            ModelInfo {
                id: "opengvlab/internvl3-2b:free",
                name: "InternVL3 2B",
                description: "2B lightweight model.",
            },
        ],
    },
    ModelCategory {
        vendor: "Qwen",
        models: &[
            ModelInfo {
                id: "qwen/qwen3-14b:free",
                name: "Qwen3 14B",
                description: "14B model for general language tasks.",
            },
            ModelInfo {
                id: "qwen/qwen3-235b-a22b:free",
                name: "Qwen3 235B",
                description: "235B parameters (22B active), the largest Qwen3.",
            },
            ModelInfo {
                id: "qwen/qwen3-30b-a3b:free",
                name: "Qwen3 30B",
                description: "30B parameters (3B active).",
            },
            ModelInfo {
                id: "qwen/qwen3-32b:free",
                name: "Qwen3 32B",
                description: "32B dense model.",
            },
            ModelInfo {
                id: "qwen/qwen3-8b:free",
                name: "Qwen3 8B",
                description: "8B lightweight model.",
            },
        ],
    },
    ModelCategory {
        vendor: "THUDM",
        models: &[
            ModelInfo {
                id: "thudm/glm-4-32b:free",
                name: "GLM-4 32B",
                description: "32B general-purpose GLM.",
            },
            ModelInfo {
                id: "thudm/glm-z1-32b:free",
                name: "GLM-Z1 32B",
                description: "GLM-4 variant tuned for reasoning.",
            },
        ],
    },
    ModelCategory {
        vendor: "Other",
        models: &[
            ModelInfo {
                id: "nousresearch/deephermes-3-mistral-24b-preview:free",
                name: "DeepHermes 3 Mistral 24B",
                description: "24B Nous Research model for reasoning.",
            },
            ModelInfo {
                id: "tngtech/deepseek-r1t-chimera:free",
                name: "DeepSeek R1T Chimera",
                description: "Merge of DeepSeek R1 and V3.",
            },
        ],
    },
];

static MODEL_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*/[A-Za-z0-9][A-Za-z0-9._-]*(:[A-Za-z0-9._-]+)?$")
        .expect("valid regex")
});

/// Iterate over every model in catalog order.
pub fn all_models() -> impl Iterator<Item = &'static ModelInfo> {
    MODEL_CATALOG.iter().flat_map(|c| c.models.iter())
}

/// Look up a catalog entry by identifier.
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    all_models().find(|m| m.id == id)
}

/// `vendor/model` with an optional `:tag`.
pub fn is_valid_model_id(id: &str) -> bool {
    MODEL_ID_RE.is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_model_is_in_catalog() {
        assert!(find_model(DEFAULT_MODEL).is_some());
    }

    #[test]
    fn catalog_ids_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for m in all_models() {
            assert!(seen.insert(m.id), "duplicate id {}", m.id);
            assert!(is_valid_model_id(m.id), "malformed id {}", m.id);
        }
        assert!(seen.len() >= 10);
    }

    #[test]
    fn catalog_covers_every_vendor_group() {
        let vendors: Vec<&str> = MODEL_CATALOG.iter().map(|c| c.vendor).collect();
        assert_eq!(
            vendors,
            vec![
                "DeepSeek",
                "Meta Llama",
                "Mistral",
                "Google",
                "Microsoft",
                "OpenGVLab",
                "Qwen",
                "THUDM",
                "Other",
            ]
        );
        assert_eq!(all_models().count(), 25);
        for id in [
            "qwen/qwen3-14b:free",
            "thudm/glm-4-32b:free",
            "tngtech/deepseek-r1t-chimera:free",
        ] {
            assert!(find_model(id).is_some(), "missing {id}");
        }
    }

    #[test]
    fn model_id_validation() {
        assert!(is_valid_model_id("openai/gpt-4o-mini"));
        assert!(is_valid_model_id("qwen/qwen-2.5-72b-instruct:free"));
        assert!(!is_valid_model_id("gpt-4o"));
        assert!(!is_valid_model_id("a/b c"));
        assert!(!is_valid_model_id("/model"));
        assert!(!is_valid_model_id("vendor/model:"));
    }
}
