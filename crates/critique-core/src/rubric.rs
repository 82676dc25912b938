/// Review rubric: what each report section covers. Embedded in the evaluation
/// system prompt next to the envelope schema.
pub const RUBRIC: &str = "\
1. code_quality: structure, naming, duplication and dead code. Point at concrete lines or \
constructs, not at the submission as a whole.\n\
2. best_practices: idioms of the submitted language, error handling, input validation and \
use of the standard library. Name the practice being violated.\n\
3. performance: algorithmic complexity, unnecessary allocation or I/O, and hot paths. Only \
mention a cost when it matters at realistic input sizes.\n\
4. readability: layout, comments, function length and how easily a newcomer can follow the \
control flow.\n\
5. security_considerations: injection, unchecked input, secrets in code, unsafe \
deserialization. Say \"No security issues found.\" rather than inventing one.\n\
6. recommendations.improved_function: a rewritten version of the main function. Put the \
explanation in \"explanation\" and the complete rewritten function in \"code\", without \
markdown fences.\n\
7. recommendations.informative_feedback: broader advice for the author. An illustrative \
snippet may be included in \"code\"; leave it empty when none is needed.\n\
\n\
Every narrative field is plain prose. If a field needs a code example, put it in a fenced \
block labelled with the language, e.g. ```javascript ... ```.";
