use crate::config::types::{Config, SectionKind, Value};

/// Render a config back to the text grammar.
///
/// Every section and attribute is preceded by a `# from line N` comment;
/// injected defaults show line 0.
pub fn dump_config(config: &Config) -> String {
	let mut out = String::new();

	for section in config.sections() {
		out.push_str(&format!("# from line {}\n", section.line));
		out.push_str(&format!("{}:\n", section.name()));

		for (key, entry) in section.iter() {
			for attr in entry.attributes() {
				out.push_str(&format!("  # from line {}\n", attr.line));
				match section.kind() {
					SectionKind::Watch => {
						out.push_str(&format!("  {key}\n"));
					}
					SectionKind::Env | SectionKind::Config => {
						out.push_str(&format!("  {key} {}\n", attr.value));
					}
					SectionKind::Default | SectionKind::Rule => {
						let args = match &attr.value {
							Value::Args(args) => args.iter().map(|a| quote(a)).collect::<Vec<_>>(),
							other => vec![quote(&other.to_string())],
						};
						out.push_str(&format!("  {key} {}\n", args.join(" ")));
					}
				}
			}
		}
	}

	out
}

/// Double-quote `arg` so it tokenizes back to itself.
fn quote(arg: &str) -> String {
	let mut quoted = String::with_capacity(arg.len() + 2);
	quoted.push('"');
	for c in arg.chars() {
		if matches!(c, '"' | '\\' | '$' | '`') {
			quoted.push('\\');
		}
		quoted.push(c);
	}
	quoted.push('"');
	quoted
}
