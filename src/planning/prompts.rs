// Prompt templates for retrieval, planning and plan verification

use super::types::{Exemplar, SharedContext};

/// Tags whose contents may contain markup-breaking characters (`<`, `&`, code)
/// and are CDATA-wrapped before the retrieval response is parsed.
pub const RETRIEVAL_TEXT_TAGS: [&str; 6] = [
    "algorithm",
    "description",
    "code",
    "planning",
    "techniques",
    "learned_techniques",
];

pub const VERIFICATION_TEXT_TAGS: [&str; 2] = ["analysis", "confidence"];

/// Repeating field holding one exemplar
pub const EXEMPLAR_TAG: &str = "problem";

pub fn retrieval_prompt(problem: &str, k: usize, language: &str) -> String {
    format!(
        r#"Given a problem, recall related problems and learn code generation techniques from them. Also identify the algorithm the problem calls for and write a tutorial on it.
# Problem:
{problem}

# Exemplars:
Recall {k} relevant and distinct problems (different from the problem above). For each one:
1. Describe it concisely
2. Write {language} code step by step that solves it
3. Extract 1-3 key code generation techniques the solution uses
4. Write a detailed plan for solving it

# Algorithm:

----------------
Important:
Your response must use the following XML layout:

<root>
<problem>
<description>
# Concise description of the problem.
</description>
<code>
# Step-by-step {language} solution.
</code>
<techniques>
# 1-3 key code generation techniques used in the solution.
</techniques>
<planning>
# Detailed plan for solving the problem.
</planning>
</problem>

# More problems here...

<algorithm>
# Name the algorithm needed for the original problem (Brute-force, Dynamic Programming, Divide-and-conquer, Greedy, Backtracking, Recursive, Binary search, etc.).
# Write a high-level, generic tutorial for solving this kind of problem. Do not write code.
</algorithm>

<learned_techniques>
# Summarize 3-5 key code generation techniques learned from all the exemplars.
</learned_techniques>
</root>
"#
    )
}

pub fn planning_prompt(
    exemplar: &Exemplar,
    context: &SharedContext,
    problem: &str,
    sample_io: &str,
) -> String {
    format!(
        r#"Given a competitive programming problem, write a detailed step-by-step plan for solving it.
# Example Problem:
{description}

# Example Techniques:
{techniques}

# Example Planning:
{planning}

# Algorithm:
{algorithm}

# Learned Techniques:
{learned}

# Problem to Solve:
{problem}

# Sample Test Cases:
{sample_io}

# Detailed Planning:
Write the plan as numbered steps:
1. Step 1: [first step]
2. Step 2: [second step]
...
n. Step n: [final step]

Important:
- Make every step specific and concrete
- Cover edge cases and input/output handling
- Account for time and space complexity
- Do not write code, only the plan
"#,
        description = exemplar.description,
        techniques = exemplar.techniques,
        planning = exemplar.planning,
        algorithm = context.algorithm_prompt(),
        learned = context.techniques_prompt(),
    )
}

pub fn verification_prompt(problem: &str, plan: &str) -> String {
    format!(
        r#"Assess the plan below for solving the problem. Give a confidence score (0-100) and explain your reasoning.
# Problem:
{problem}

# Proposed Plan:
{plan}

# Evaluation Criteria:
1. Completeness: does the plan cover every part of the problem?
2. Correctness: is the algorithmic approach sound?
3. Feasibility: can the plan be implemented as written?
4. Edge Cases: does the plan handle boundary conditions?
5. Efficiency: does the plan account for time and space complexity?

# Your Response:
<root>
<analysis>
# Strengths and weaknesses of the plan
</analysis>
<confidence>
# Confidence score, an integer from 0 to 100, based on the criteria above
</confidence>
</root>
"#
    )
}

/// Sample tests as they appear in planning and coding prompts
pub fn sample_io_section(rendered: &str) -> String {
    format!("## Sample Test cases: \n{}\n", rendered)
}
