//! Built-in prompt text.

/// Used when no system prompt is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an investigation assistant with access to backend tools.

Answer questions by writing TypeScript for the execute_code tool. Batch \
independent operations into a single execute_code call instead of making \
several small ones, and return everything you need with output(). Use \
debug() for intermediate notes. When you have enough information, answer \
in plain text without calling tools.";

/// Lead-in of the execute_code description. The registry documentation is
/// appended after it.
pub const EXECUTE_CODE_PREAMBLE: &str = "\
Execute TypeScript code in a sandboxed Deno runtime.

The code has access to backend tools via the `tools` namespace. Use `output()` to return results.

Example:
```typescript
const result = await tools.datastore.query(\"SELECT count() FROM events\");
output(result);
```
";

/// Description of the `code` input.
pub const CODE_PARAM_DESCRIPTION: &str =
    "TypeScript code to execute. Has access to the `tools` namespace and the `output()` function.";
