// Prompt templates for code generation and repair

use crate::planning::SharedContext;

pub fn coding_prompt(
    problem: &str,
    plan: &str,
    sample_io: &str,
    context: &SharedContext,
    language: &str,
    io_convention: Option<&str>,
) -> String {
    let io_step = io_convention
        .map(|note| format!("4. {}\n", note))
        .unwrap_or_default();

    format!(
        r#"Write {language} code that solves the following problem by following the given plan.
# Problem:
{problem}

# Planning:
{plan}

# Sample Test Cases:
{sample_io}

# Learned Techniques:
{learned}

# Algorithm:
{algorithm}

# Instructions:
1. Implement the solution exactly as planned
2. Comment the key steps
3. Handle edge cases
{io_step}
# Your Response:
Return only the {language} code, without explanations.
"#,
        learned = context.techniques_prompt(),
        algorithm = context.algorithm_prompt(),
    )
}

pub fn repair_prompt(
    problem: &str,
    context: &SharedContext,
    language: &str,
    response_record: &str,
    test_log: &str,
    io_convention: Option<&str>,
) -> String {
    format!(
        "You wrote {language} code for a competitive programming problem, but it fails the \
sample test cases. Improve the code so it solves the problem correctly.\n\
{algorithm}\n\
## Problem to be solved:\n{problem}\n\
{response_record}\n\
## Test Report:\n{test_log}\n\
## Modified Planning:\n\
## Let's think step by step to modify the {language} code for solving this problem.\n\n\
----------------\n\
Important:\n{io}\n\
## Your response must contain the modified planning followed by the {language} code \
inside a ``` block.",
        algorithm = context.algorithm_prompt(),
        io = io_convention.unwrap_or_default(),
    )
}

/// The plan and code shown to the model in the first repair request
pub fn response_record(plan: &str, code: &str) -> String {
    format!("## Planning: {}\n## Code:\n```\n{}\n```", plan, code)
}
