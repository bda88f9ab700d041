//! Prompt templates for the synthesis flow

/// Templates for generating prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// Preamble telling the synthesis model what to do with the outputs
    pub fn synthesis_preamble() -> &'static str {
        r#"You are synthesizing the answers of several independent AI models to the same task.
Your job is to:
1. Identify where the answers agree
2. Resolve disagreements by weighing the reasoning behind each position
3. Merge the strongest elements into one complete, well-organized answer
4. Drop repetition and anything that is clearly wrong

Respond with the unified answer only. Do not describe the individual models."#
    }

    /// Full synthesis prompt: the original instructions followed by every
    /// successful output labelled with the model that produced it.
    ///
    /// `outputs` is expected in a deterministic order (the caller sorts by
    /// model name).
    pub fn synthesis_prompt(instructions: &str, outputs: &[(String, String)]) -> String {
        let mut prompt = format!(
            "{}\n\n<instructions>\n{}\n</instructions>\n\n<model_outputs>\n",
            Self::synthesis_preamble(),
            instructions
        );

        for (model, content) in outputs {
            prompt.push_str(&format!(
                "<model_result model=\"{}\">\n{}\n</model_result>\n",
                model, content
            ));
        }

        prompt.push_str("</model_outputs>\n");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_prompt_format() {
        let outputs = vec![
            ("m1".to_string(), "Answer A".to_string()),
            ("m2".to_string(), "Answer B".to_string()),
        ];
        let prompt = PromptTemplate::synthesis_prompt("Summarize X", &outputs);

        assert!(prompt.contains("<instructions>\nSummarize X\n</instructions>"));
        assert!(prompt.contains("<model_result model=\"m1\">\nAnswer A\n</model_result>"));
        assert!(prompt.contains("<model_result model=\"m2\">\nAnswer B\n</model_result>"));

        let first = prompt.find("m1").unwrap();
        let second = prompt.find("m2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_synthesis_prompt_with_no_outputs() {
        let prompt = PromptTemplate::synthesis_prompt("Task", &[]);
        assert!(prompt.contains("<model_outputs>\n</model_outputs>"));
    }
}
