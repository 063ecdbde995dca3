/// Starter `.patchrun.toml` written by `patchrun --init`.
pub fn generate_init_template() -> String {
	r#"# patchrun rule file
#
# Patches are applied in order. Each target file is read once, every rule
# that names it is applied in declaration order, and the file is written
# back only if its content changed.

# Relative target paths resolve against this directory (itself relative to
# this file). Override with --base-dir.
base-dir = "."

# Default pattern flags; each rule may override them.
[flags]
multi-line = false
dot-matches-new-line = false
case-insensitive = false

[[patches]]
description = "Redirect repository calls to the data service"
files = ["src/Example.java"]

[[patches.rules]]
pattern = '\bteacherRepository\.'
replacement = "sisDataService."

# Add an import once, after the first existing import
[[patches.rules]]
pattern = '(import [^;]+;)\n'
replacement = "${1}\nimport com.example.DataService;\n"
limit = 1
unless_contains = "import com.example.DataService;"

# sed-style shorthand: flags g (global), m (multi-line), s (dot matches newline), i
[[patches.rules]]
substitute = "s/\\.showAndWait\\(\\)/.show()/g"
"#
	.to_string()
}
