//! Prompt assembly.

/// Introduces the optional sample test.
pub const SAMPLE_HEADING: &str = "Use the following sample unit test as a reference for the structure and style:";
/// Introduces the code under test.
pub const CODE_HEADING: &str = "Method Code:";
/// Introduces the current test file.
pub const EXISTING_HEADING: &str = "Existing Tests:";
/// Closing directive.
pub const CLOSING_DIRECTIVE: &str = "Provide the complete updated test file content as output.";

/// Builds the generation prompt.
///
/// The sample section is omitted when `sample` is blank; the existing-tests
/// section is always present, possibly empty.
pub fn build_prompt(template: &str, sample: &str, code: &str, existing_tests: &str) -> String {
    let mut prompt = template.trim_end().to_string();
    if !sample.trim().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(SAMPLE_HEADING);
        prompt.push('\n');
        prompt.push_str(sample);
    }
    prompt.push_str(&format!(
        "\n\n{}\n{}\n\n{}\n{}\n\n{}",
        CODE_HEADING, code, EXISTING_HEADING, existing_tests, CLOSING_DIRECTIVE
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_sample() {
        let prompt = build_prompt("Write tests.", "  ", "class A {}", "");
        assert_eq!(
            prompt,
            "Write tests.\n\nMethod Code:\nclass A {}\n\nExisting Tests:\n\n\nProvide the complete updated test file content as output."
        );
    }

    #[test]
    fn test_prompt_section_order() {
        let prompt = build_prompt("Write tests.", "class SampleTests {}", "class A {}", "class ATests {}");
        let sample = prompt.find(SAMPLE_HEADING).unwrap();
        let code = prompt.find(CODE_HEADING).unwrap();
        let existing = prompt.find(EXISTING_HEADING).unwrap();
        let closing = prompt.find(CLOSING_DIRECTIVE).unwrap();
        assert!(sample < code && code < existing && existing < closing);
        assert!(prompt.contains("class ATests {}"));
    }
}
