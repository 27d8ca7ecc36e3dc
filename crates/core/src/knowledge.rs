//! Typed knowledge records for the tutoring show and their passage form.
//!
//! [`Experiment`] and [`QaPair`] are the two record shapes ingested besides
//! free text. [`sample_knowledge`] is the seed corpus used to bootstrap an
//! empty store.

use crate::document::{Metadata, MetadataValue};
use serde::{Deserialize, Serialize};

fn default_age_min() -> u32 {
    5
}
fn default_age_max() -> u32 {
    12
}
fn default_wow_factor() -> u32 {
    5
}
fn default_topic() -> String {
    "general".to_string()
}
fn default_difficulty() -> String {
    "medium".to_string()
}

/// A demonstrable science experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default = "default_age_min")]
    pub age_min: u32,
    #[serde(default = "default_age_max")]
    pub age_max: u32,
    /// How exciting the demo is, 1–10.
    #[serde(default = "default_wow_factor")]
    pub wow_factor: u32,
    #[serde(default)]
    pub safety_notes: String,
}

impl Experiment {
    /// Passage text `"name: description"` plus its metadata.
    pub fn to_passage(&self) -> (String, Metadata) {
        let text = format!("{}: {}", self.name, self.description);
        let mut metadata = Metadata::new();
        metadata.insert("name".into(), self.name.clone().into());
        metadata.insert("category".into(), self.category.clone().into());
        metadata.insert("age_min".into(), MetadataValue::Number(self.age_min.into()));
        metadata.insert("age_max".into(), MetadataValue::Number(self.age_max.into()));
        metadata.insert(
            "wow_factor".into(),
            MetadataValue::Number(self.wow_factor.into()),
        );
        metadata.insert("safety_notes".into(), self.safety_notes.clone().into());
        (text, metadata)
    }
}

/// A question with its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// `easy`, `medium`, or `hard`.
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

impl QaPair {
    /// Passage text `"Q: question\nA: answer"` plus its metadata.
    pub fn to_passage(&self) -> (String, Metadata) {
        let text = format!("Q: {}\nA: {}", self.question, self.answer);
        let mut metadata = Metadata::new();
        metadata.insert("question".into(), self.question.clone().into());
        metadata.insert("answer".into(), self.answer.clone().into());
        metadata.insert("topic".into(), self.topic.clone().into());
        metadata.insert("difficulty".into(), self.difficulty.clone().into());
        (text, metadata)
    }
}

struct SeedPassage {
    text: &'static str,
    topic: &'static str,
    experiment: &'static str,
    difficulty: &'static str,
    age_range: &'static str,
}

const SEED_PASSAGES: &[SeedPassage] = &[
    SeedPassage {
        text: "Elephant toothpaste is a dramatic chemical reaction that produces massive amounts of foam. \
               When hydrogen peroxide decomposes with the help of a catalyst (like yeast or potassium iodide), \
               it rapidly breaks down into water and oxygen gas. The soap traps the oxygen bubbles, creating \
               thick foam that shoots up like toothpaste for an elephant! The reaction is exothermic, \
               meaning it releases heat energy.",
        topic: "chemistry",
        experiment: "elephant_toothpaste",
        difficulty: "medium",
        age_range: "8-14",
    },
    SeedPassage {
        text: "A catalyst is a special substance that speeds up a chemical reaction without being \
               used up itself. Think of it like a helpful friend who makes things happen faster but doesn't \
               get tired! In elephant toothpaste, yeast acts as a catalyst to break down hydrogen peroxide \
               much faster than it would naturally. The catalyst provides an easier pathway for the reaction.",
        topic: "chemistry",
        experiment: "elephant_toothpaste",
        difficulty: "easy",
        age_range: "7-12",
    },
    SeedPassage {
        text: "Chemical reactions happen when atoms and molecules rearrange themselves to form \
               new substances. The starting materials are called reactants, and what you end up with are \
               called products. During a reaction, chemical bonds break and new ones form. Some reactions \
               release energy (exothermic) while others absorb energy (endothermic). Signs of a chemical \
               reaction include color changes, temperature changes, gas production, or precipitate formation.",
        topic: "chemistry",
        experiment: "general",
        difficulty: "medium",
        age_range: "10-14",
    },
    SeedPassage {
        text: "Dry ice is frozen carbon dioxide at -78.5°C (-109°F). When it warms up, it sublimates - \
               meaning it goes directly from solid to gas without becoming liquid! This creates spooky fog effects. \
               The 'fog' you see is actually tiny water droplets condensed from the air by the cold CO2 gas. \
               Dry ice is heavier than air, so the fog sinks down, making it perfect for Halloween effects \
               and science demonstrations.",
        topic: "physics",
        experiment: "dry_ice",
        difficulty: "medium",
        age_range: "8-14",
    },
    SeedPassage {
        text: "Static electricity occurs when electric charges build up on the surface of objects. \
               When you rub a balloon on your hair, electrons transfer from your hair to the balloon. \
               The balloon becomes negatively charged and your hair becomes positively charged. Opposite \
               charges attract, so your hair stands up toward the balloon! Lightning is a dramatic example \
               of static electricity in nature.",
        topic: "physics",
        experiment: "static_electricity",
        difficulty: "easy",
        age_range: "6-12",
    },
    SeedPassage {
        text: "Slime is a non-Newtonian fluid, meaning it doesn't follow normal liquid rules. \
               When you mix glue (polyvinyl alcohol) with borax or contact lens solution (containing borate ions), \
               the molecules form long, flexible chains called polymers. These chains slide past each other \
               when you move slowly, but tangle up when you move fast. That's why slime can flow like liquid \
               but also bounce like a solid!",
        topic: "chemistry",
        experiment: "slime",
        difficulty: "easy",
        age_range: "6-12",
    },
    SeedPassage {
        text: "Becoming a scientist means asking questions about the world and finding answers through \
               experiments. Scientists observe, wonder, test ideas, and learn from mistakes. You don't need \
               fancy equipment - curiosity and careful observation are your best tools! Every great scientist \
               started as a curious kid who loved to explore. The scientific method is: Question, Hypothesis, \
               Experiment, Analyze, Conclude. Remember: failure is just learning what doesn't work!",
        topic: "general",
        experiment: "inspiration",
        difficulty: "easy",
        age_range: "6-14",
    },
];

/// Seed passages and their metadata, ready for `add_knowledge`.
pub fn sample_knowledge() -> (Vec<String>, Vec<Metadata>) {
    SEED_PASSAGES
        .iter()
        .map(|seed| {
            let mut metadata = Metadata::new();
            metadata.insert("topic".into(), seed.topic.into());
            metadata.insert("experiment".into(), seed.experiment.into());
            metadata.insert("difficulty".into(), seed.difficulty.into());
            metadata.insert("age_range".into(), seed.age_range.into());
            (seed.text.to_string(), metadata)
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_defaults_from_json() {
        let exp: Experiment = serde_json::from_str(
            r#"{"name": "Lava lamp", "description": "Oil and water with fizzing tablets", "category": "chemistry"}"#,
        )
        .unwrap();
        assert_eq!(exp.age_min, 5);
        assert_eq!(exp.age_max, 12);
        assert_eq!(exp.wow_factor, 5);
        assert_eq!(exp.safety_notes, "");
    }

    #[test]
    fn test_experiment_passage() {
        let exp = Experiment {
            name: "Dry ice fog".into(),
            description: "Sublimation makes fog".into(),
            category: "physics".into(),
            age_min: 8,
            age_max: 14,
            wow_factor: 9,
            safety_notes: "Use gloves".into(),
        };
        let (text, metadata) = exp.to_passage();
        assert_eq!(text, "Dry ice fog: Sublimation makes fog");
        assert_eq!(metadata["category"].as_str(), Some("physics"));
        assert_eq!(metadata["age_min"].as_f64(), Some(8.0));
        assert_eq!(metadata["wow_factor"].as_f64(), Some(9.0));
    }

    #[test]
    fn test_qa_pair_passage_and_defaults() {
        let qa: QaPair =
            serde_json::from_str(r#"{"question": "Why is the sky blue?", "answer": "Scattering."}"#)
                .unwrap();
        assert_eq!(qa.topic, "general");
        assert_eq!(qa.difficulty, "medium");
        let (text, metadata) = qa.to_passage();
        assert_eq!(text, "Q: Why is the sky blue?\nA: Scattering.");
        assert_eq!(metadata["topic"].as_str(), Some("general"));
    }

    #[test]
    fn test_sample_knowledge_shape() {
        let (texts, metadata) = sample_knowledge();
        assert_eq!(texts.len(), 7);
        assert_eq!(metadata.len(), 7);
        assert!(texts[1].starts_with("A catalyst is a special substance"));
        assert!(!texts[0].contains("  "));
        assert_eq!(metadata[3]["topic"].as_str(), Some("physics"));
    }
}
