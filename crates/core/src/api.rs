// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of known service implementation types and their APIs.
//!
//! The broker classifies a package by looking its manifest `type` up here;
//! the worker binary registers a concrete factory for each type it can
//! instantiate. Both sides must agree on the method surface, so the
//! registry is the single source of api names and method lists.

use std::collections::HashMap;

/// Static description of one service implementation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSpec {
    /// Implementation type name as written in `config.yml`.
    pub service_type: &'static str,
    /// Stable API family name (clients may address a service by it).
    pub api_name: &'static str,
    /// Methods this implementation exposes over JSON-RPC.
    pub methods: &'static [&'static str],
    /// First paragraph of the implementation description.
    pub short_description: &'static str,
    /// Full implementation description.
    pub description: &'static str,
}

impl ApiSpec {
    /// Whether `method` is part of this API.
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }
}

/// Lookup table from implementation type name to its [`ApiSpec`].
#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    specs: HashMap<&'static str, ApiSpec>,
}

impl ApiRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the implementation types this
    /// distribution knows about.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for spec in BUILTIN_SPECS {
            registry.register(*spec);
        }
        registry
    }

    /// Register (or replace) a spec.
    pub fn register(&mut self, spec: ApiSpec) {
        self.specs.insert(spec.service_type, spec);
    }

    /// Spec for a manifest type name, if known.
    pub fn get(&self, service_type: &str) -> Option<&ApiSpec> {
        self.specs.get(service_type)
    }

    /// Iterate all registered specs.
    pub fn iter(&self) -> impl Iterator<Item = &ApiSpec> {
        self.specs.values()
    }
}

const BUILTIN_SPECS: &[ApiSpec] = &[
    ApiSpec {
        service_type: "Echo",
        api_name: "EchoAPI",
        methods: &["echo"],
        short_description: "Echo service for wiring tests.",
        description: "Echo service for wiring tests.\n\nReplies with its first \
                      parameter verbatim. Useful for exercising the broker \
                      without loading a model.",
    },
    ApiSpec {
        service_type: "HfChatbot",
        api_name: "TextGenerationAPI",
        methods: &[
            "generate_reply",
            "get_prompt_template",
            "get_special_tokens",
            "get_context_template",
        ],
        short_description: "Conversational text generation from exported \
                            transformer checkpoints.",
        description: "Conversational text generation from exported transformer \
                      checkpoints.\n\nRenders a prompt template over the \
                      caller-supplied context and decodes a reply.",
    },
    ApiSpec {
        service_type: "BartChatbot",
        api_name: "TextGenerationAPI",
        methods: &[
            "generate_reply",
            "get_prompt_template",
            "get_special_tokens",
            "get_context_template",
        ],
        short_description: "BART-based dialogue generation.",
        description: "BART-based dialogue generation.\n\nEncoder-decoder text \
                      generation tuned for persona dialogue.",
    },
    ApiSpec {
        service_type: "SimilarityTransformers",
        api_name: "SimilarityAPI",
        methods: &["compare", "cache"],
        short_description: "Sentence embedding similarity scoring.",
        description: "Sentence embedding similarity scoring.\n\nCompares a query \
                      against a list of context sentences and returns one score \
                      per sentence; embeddings may be cached across calls.",
    },
    ApiSpec {
        service_type: "HfClassifier",
        api_name: "SequenceClassifierAPI",
        methods: &["classify"],
        short_description: "Sequence classification over exported checkpoints.",
        description: "Sequence classification over exported checkpoints.\n\n\
                      Scores input sequences against the label set the model \
                      was trained with.",
    },
    ApiSpec {
        service_type: "PersonaDialogue",
        api_name: "PersonaDialogueAPI",
        methods: &["start_dialogue", "step_dialogue", "get_history"],
        short_description: "Two-character persona dialogue orchestration.",
        description: "Two-character persona dialogue orchestration.\n\nRuns a \
                      dialogue between two described characters, generating \
                      utterances through a text generation peer and matching \
                      scripted lines through a similarity peer.",
    },
    ApiSpec {
        service_type: "NemoSTT",
        api_name: "SpeechToTextAPI",
        methods: &[
            "listen",
            "stt",
            "get_devices",
            "select_device",
            "initialize_microphone_input",
        ],
        short_description: "Streaming speech recognition.",
        description: "Streaming speech recognition.\n\nTranscribes microphone \
                      or buffer input with voice activity detection.",
    },
    ApiSpec {
        service_type: "EspnetTTS",
        api_name: "TextToSpeechAPI",
        methods: &["tts_start", "tts_get_results", "get_speaker_ids"],
        short_description: "Text to speech synthesis.",
        description: "Text to speech synthesis.\n\nStreams synthesized audio \
                      chunks for a line of text and a speaker id.",
    },
    ApiSpec {
        service_type: "FlowtronTTS",
        api_name: "TextToSpeechAPI",
        methods: &["tts_start", "tts_get_results", "get_speaker_ids"],
        short_description: "Flowtron text to speech synthesis.",
        description: "Flowtron text to speech synthesis.\n\nMel-spectrogram \
                      synthesis with a vocoder back end.",
    },
];

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
