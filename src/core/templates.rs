//! Prompt template registry
//!
//! One immutable template per [`Category`]. A template renders (term, chunk)
//! into the instruction text sent to the judge: a persona, the task block, the
//! output-format contract, category-specific reasoning steps and a handful of
//! worked examples.

use serde_json::json;
use std::fmt;

use crate::core::error::ConfigurationError;
use crate::models::Category;

/// Literal the judge must answer with when nothing in the chunk fits
pub const NO_MATCH_LITERAL: &str = "NULL";

/// How forcefully the output contract is restated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Standard,
    /// Used to re-ask after an answer that was not a chunk entry or the no-match literal
    Strict,
}

/// Worked example embedded in a template
#[derive(Debug, Clone, Copy)]
pub struct FewShot {
    pub title: &'static str,
    pub input: &'static str,
    pub choices: &'static [&'static str],
    /// `None` renders as the no-match literal
    pub answer: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    category: Category,
    persona: &'static str,
    steps: &'static [&'static str],
    examples: &'static [FewShot],
}

impl PromptTemplate {
    pub const fn new(
        category: Category,
        persona: &'static str,
        steps: &'static [&'static str],
        examples: &'static [FewShot],
    ) -> Self {
        Self {
            category,
            persona,
            steps,
            examples,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn examples(&self) -> &[FewShot] {
        self.examples
    }

    /// Render the judge instruction for one chunk
    pub fn render(&self, term: &str, chunk: &[String], style: PromptStyle) -> String {
        Prompt {
            template: self,
            term,
            chunk,
            style,
        }
        .to_string()
    }
}

/// One judge instruction, formatted lazily
struct Prompt<'a> {
    template: &'a PromptTemplate,
    term: &'a str,
    chunk: &'a [String],
    style: PromptStyle,
}

impl fmt::Display for Prompt<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let template = self.template;
        let key = template.category.actual_key();

        writeln!(out, "{}", template.persona)?;
        writeln!(out)?;
        writeln!(out, "<TASK>")?;
        writeln!(out, "Fuzzy input: {}", self.term)?;
        writeln!(out, "Choices: {}", choices_json(self.chunk))?;
        writeln!(out, "</TASK>")?;
        writeln!(out)?;
        writeln!(out, "<INSTRUCTIONS>")?;
        writeln!(
            out,
            "1.  Your final answer **MUST** be one of the exact strings from the 'Choices' list, or the literal string \"{}\".",
            NO_MATCH_LITERAL
        )?;
        writeln!(out, "2.  Format your output as a single JSON object with the key \"{}\".", key)?;
        writeln!(out, "3.  Work through these steps:")?;
        for (i, step) in template.steps.iter().enumerate() {
            let letter = (b'a' + i as u8) as char;
            writeln!(out, "    {}. {}", letter, step)?;
        }
        writeln!(
            out,
            "4.  **You must not include any reasoning, explanation, or conversation in your output.**"
        )?;
        writeln!(out, "</INSTRUCTIONS>")?;
        writeln!(out)?;
        writeln!(out, "<EXAMPLES>")?;
        for (i, example) in template.examples.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "**Example {}: {}**", i + 1, example.title)?;
            writeln!(out, "Fuzzy input: {}", example.input)?;
            writeln!(out, "Choices: {}", choices_json(example.choices))?;
            writeln!(out, "Output: {}", answer_json(key, example.answer))?;
        }
        writeln!(out, "</EXAMPLES>")?;

        if self.style == PromptStyle::Strict {
            writeln!(out)?;
            writeln!(out, "<REMINDER>")?;
            writeln!(
                out,
                "A previous answer to this task was rejected because it was not copied exactly from 'Choices'."
            )?;
            writeln!(
                out,
                "Reply with exactly {} where <choice> is copied character for character from 'Choices', or with {}.",
                answer_json(key, Some("<choice>")),
                answer_json(key, None)
            )?;
            writeln!(out, "</REMINDER>")?;
        }

        writeln!(out)?;
        out.write_str("Output:\n")
    }
}

fn choices_json<S: AsRef<str>>(choices: &[S]) -> String {
    let items: Vec<&str> = choices.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
}

fn answer_json(key: &str, answer: Option<&str>) -> String {
    json!({ key: answer.unwrap_or(NO_MATCH_LITERAL) }).to_string()
}

/// Read-only map from category to its template, built once at startup
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: [PromptTemplate; 3],
}

impl TemplateRegistry {
    /// Registry with the built-in cell type, species and binding molecule templates
    pub fn standard() -> Self {
        Self {
            templates: [CELL_TYPE.clone(), SPECIES.clone(), BINDING_MOLECULE.clone()],
        }
    }

    pub fn builder() -> TemplateRegistryBuilder {
        TemplateRegistryBuilder::default()
    }

    pub fn template_for(&self, category: Category) -> &PromptTemplate {
        &self.templates[category.index()]
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Default)]
pub struct TemplateRegistryBuilder {
    slots: [Option<PromptTemplate>; 3],
}

impl TemplateRegistryBuilder {
    /// Register a template under its own category, replacing any earlier one
    pub fn register(mut self, template: PromptTemplate) -> Self {
        let index = template.category().index();
        self.slots[index] = Some(template);
        self
    }

    /// Fails if any category is left without a template
    pub fn build(self) -> Result<TemplateRegistry, ConfigurationError> {
        let [cell_type, species, binding_molecule] = self.slots;
        Ok(TemplateRegistry {
            templates: [
                cell_type.ok_or(ConfigurationError::MissingTemplate(Category::CellType))?,
                species.ok_or(ConfigurationError::MissingTemplate(Category::Species))?,
                binding_molecule.ok_or(ConfigurationError::MissingTemplate(Category::BindingMolecule))?,
            ],
        })
    }
}

pub const CELL_TYPE: PromptTemplate = PromptTemplate::new(
    Category::CellType,
    "You are an expert in cell biology and ontology matching, specializing in cell type nomenclature. \
     Your task is to find the *single best match* for a 'Fuzzy input' from a given list of 'Choices'.",
    &[
        "Analyze the 'Fuzzy input' to identify the core biological entity.",
        "Scan the 'Choices' for a direct or near-identical match.",
        "If no direct match exists, use your biological knowledge to find the most relevant choice.",
        "When several choices are relevant: if the 'Fuzzy input' carries specific annotations, prefer choices \
         matching those; if it is general, prefer the more canonical, less granular choice.",
        "If no choice is a confident semantic or biological match, it is **better to return 'NULL'** than to \
         guess a poorly related option.",
    ],
    &[
        FewShot {
            title: "Simple fuzzy match",
            input: "hek-293",
            choices: &["GM12878", "HEK293T", "K562"],
            answer: Some("HEK293T"),
        },
        FewShot {
            title: "Cell line from a description",
            input: "chronic myelogenous leukemia cell line",
            choices: &["GM12878", "A549", "K562", "HeLa-S3"],
            answer: Some("K562"),
        },
        FewShot {
            title: "Description from a cell line",
            input: "A549",
            choices: &["GM12878", "lung adenocarcinoma cell line", "MCF-7", "HeLa-S3"],
            answer: Some("lung adenocarcinoma cell line"),
        },
        FewShot {
            title: "Closest related cell line",
            input: "hep3b",
            choices: &["WTC11", "some other cell", "HepG2"],
            answer: Some("HepG2"),
        },
        FewShot {
            title: "Specific input keeps its granularity",
            input: "mammary epithelial cell adult female",
            choices: &["mammary epithelial cell female", "mammary epithelial cell female adult (23 years)"],
            answer: Some("mammary epithelial cell female adult (23 years)"),
        },
        FewShot {
            title: "General input prefers the canonical entry",
            input: "mammary epithelial cell",
            choices: &["mammary epithelial cell female", "mammary epithelial cell female adult (23 years)"],
            answer: Some("mammary epithelial cell female"),
        },
        FewShot {
            title: "No valid match",
            input: "my favorite cell",
            choices: &["HEK293", "Hep3B", "A549"],
            answer: None,
        },
    ],
);

pub const SPECIES: PromptTemplate = PromptTemplate::new(
    Category::Species,
    "You are an expert in taxonomy and species identification. \
     Your task is to find the **single best match** for a 'Fuzzy input' from the 'Choices' list.",
    &[
        "Identify the 'Fuzzy input': is it a scientific name (e.g. *Homo sapiens*), a common name (e.g. human), \
         or a likely abbreviation or typo?",
        "Look for a direct, near-identical match in the 'Choices' list.",
        "If no direct match exists, use taxonomic knowledge to find the equivalent: a common name should match \
         its scientific name in the choices, and vice versa.",
        "If no choice is a confident match, it is **better to return 'NULL'** than to guess a poorly related option.",
    ],
    &[
        FewShot {
            title: "Common to scientific name",
            input: "human",
            choices: &["Homo sapiens", "Mus musculus"],
            answer: Some("Homo sapiens"),
        },
        FewShot {
            title: "Model organism common name",
            input: "fruit fly",
            choices: &["Danio rerio", "Drosophila melanogaster"],
            answer: Some("Drosophila melanogaster"),
        },
        FewShot {
            title: "Scientific to common name",
            input: "Mus musculus",
            choices: &["house mouse", "Rattus norvegicus"],
            answer: Some("house mouse"),
        },
        FewShot {
            title: "Abbreviated genus",
            input: "H. sapiens",
            choices: &["Homo sapiens", "Pan troglodytes"],
            answer: Some("Homo sapiens"),
        },
        FewShot {
            title: "No valid match",
            input: "dog",
            choices: &["Homo sapiens", "Mus musculus", "Drosophila melanogaster"],
            answer: None,
        },
    ],
);

pub const BINDING_MOLECULE: PromptTemplate = PromptTemplate::new(
    Category::BindingMolecule,
    "You are an expert in molecular biology, specializing in DNA-binding molecules such as Transcription \
     Factors (TFs) and Histone Modifications (HMs). Your task is to match the 'Fuzzy input' to the closest \
     canonical term in the 'Choices' list, which may mix TFs and HMs.",
    &[
        "Determine the biological nature of the 'Fuzzy input': **transcription factor**, **histone modification**, \
         **co-factor**, or another DNA-associated protein; note whether it is a gene symbol, full name, synonym \
         or description.",
        "Scan the 'Choices' for direct matches, canonical equivalents or strong synonyms.",
        "**Prioritize the choice that belongs to the same biological category** as the input; a histone mark \
         must not be matched to a transcription factor.",
        "If no choice is a confident match, it is **better to return 'NULL'** than to guess a poorly related option.",
    ],
    &[
        FewShot {
            title: "Histone modification description to mark",
            input: "H3K4 trimethylation",
            choices: &["CTCF", "H3K4me3", "POLR2A"],
            answer: Some("H3K4me3"),
        },
        FewShot {
            title: "Full name to gene symbol",
            input: "RNA Polymerase II",
            choices: &["CTCF", "H3K27ac", "POLR2A"],
            answer: Some("POLR2A"),
        },
        FewShot {
            title: "Synonym to gene symbol",
            input: "c-Myc",
            choices: &["MYC", "MAX", "H3K27ac"],
            answer: Some("MYC"),
        },
        FewShot {
            title: "Co-activator common name",
            input: "p300",
            choices: &["CREBBP", "HDAC1", "EP300"],
            answer: Some("EP300"),
        },
        FewShot {
            title: "Category mismatch",
            input: "CTCF",
            choices: &["H3K4me1", "H3K27me3", "H3K9me3"],
            answer: None,
        },
        FewShot {
            title: "Irrelevant molecule",
            input: "Actin",
            choices: &["CTCF", "POLR2A", "MYC"],
            answer: None,
        },
    ],
);
