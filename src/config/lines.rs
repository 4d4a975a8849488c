/// Iterator over the logical lines of a configuration file.
///
/// Yields `(line_number, text)` pairs where:
/// - lines whose trimmed text starts with `#` are dropped,
/// - a line ending in `\` is joined with the following line,
/// - empty lines are dropped.
///
/// The reported number is the physical line on which a joined statement
/// completes. A file ending mid-continuation is flushed on a synthetic line
/// one past the end.
#[derive(Debug)]
pub struct LogicalLines<'a> {
	lines: std::str::Lines<'a>,
	line_number: usize,
	acc: String,
	finished: bool,
}

impl<'a> LogicalLines<'a> {
	pub fn new(content: &'a str) -> Self {
		LogicalLines {
			lines: content.lines(),
			line_number: 0,
			acc: String::new(),
			finished: false,
		}
	}

	fn flush(&mut self) -> Option<(usize, String)> {
		if self.acc.is_empty() {
			return None;
		}
		Some((self.line_number, std::mem::take(&mut self.acc)))
	}
}

impl Iterator for LogicalLines<'_> {
	type Item = (usize, String);

	fn next(&mut self) -> Option<Self::Item> {
		while !self.finished {
			let Some(line) = self.lines.next() else {
				self.finished = true;
				self.line_number += 1;
				return self.flush();
			};
			self.line_number += 1;

			if line.trim_start().starts_with('#') {
				continue;
			}

			if let Some(head) = line.strip_suffix('\\') {
				self.acc.push_str(head);
				continue;
			}

			self.acc.push_str(line);
			if let Some(item) = self.flush() {
				return Some(item);
			}
		}

		None
	}
}
