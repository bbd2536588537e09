//! Lua snippets sent through the `executeCommand` tool.
//!
//! Window numbers count "editor windows" only: non-floating windows whose
//! buffer is neither a terminal nor a `nofile` scratch buffer, in
//! `nvim_list_wins` order, starting at 1.

use std::fmt::Write as _;
use std::path::Path;

/// Binds `wins` to the editor windows.
const EDITOR_WINDOWS: &str = r#"local wins = vim.tbl_filter(function(w)
	local buf = vim.api.nvim_win_get_buf(w)
	local bt = vim.bo[buf].buftype
	local cfg = vim.api.nvim_win_get_config(w)
	return bt ~= "terminal" and bt ~= "nofile" and (not cfg.relative or cfg.relative == "")
end, vim.api.nvim_list_wins())
"#;

/// Returns a JSON array of `{num, file, current}` for every editor window.
pub fn list_windows() -> String {
	format!(
		r#"{EDITOR_WINDOWS}local result = {{}}
for i, w in ipairs(wins) do
	local name = vim.api.nvim_buf_get_name(vim.api.nvim_win_get_buf(w))
	table.insert(result, {{
		num = i,
		file = name ~= "" and name or "[empty]",
		current = w == vim.api.nvim_get_current_win(),
	}})
end
return vim.json.encode(result)
"#
	)
}

pub fn focus_window(window: u32) -> String {
	with_window(window, "vim.api.nvim_set_current_win(win)\n", &format!("Focused window {window}"))
}

pub fn close_window(window: u32) -> String {
	with_window(window, "vim.api.nvim_win_close(win, false)\n", &format!("Closed window {window}"))
}

/// Edits `path` inside editor window `window`, optionally moving the cursor
/// to `line`, and focuses that window.
pub fn open_in_window(window: u32, path: &Path, line: Option<u32>) -> String {
	let mut body = format!(
		"vim.api.nvim_win_call(win, function()\n\tvim.cmd(\"edit \" .. vim.fn.fnameescape({}))\nend)\n",
		lua_string(&path.to_string_lossy())
	);
	if let Some(line) = line {
		let _ = writeln!(body, "vim.api.nvim_win_set_cursor(win, {{{line}, 0}})");
	}
	body.push_str("vim.api.nvim_set_current_win(win)\n");
	with_window(window, &body, &format!("Opened in window {window}"))
}

/// Runs `body` with `win` bound to editor window `window`, returning
/// `success`, or a not-found message naming how many editor windows exist.
fn with_window(window: u32, body: &str, success: &str) -> String {
	let mut lua = String::from(EDITOR_WINDOWS);
	let _ = write!(
		lua,
		"local win = wins[{window}]\nif win then\n{body}return {}\nend\nreturn {} .. #wins .. \" editor windows\"\n",
		lua_string(success),
		lua_string(&format!("Window {window} not found, only ")),
	);
	lua
}

/// Quotes `value` as a Lua string literal.
fn lua_string(value: &str) -> String {
	let mut out = String::with_capacity(value.len() + 2);
	out.push('"');
	for ch in value.chars() {
		match ch {
			'\\' => out.push_str("\\\\"),
			'"' => out.push_str("\\\""),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if c.is_ascii_control() => {
				// Decimal escapes are the only numeric form LuaJIT accepts.
				let _ = write!(out, "\\{:03}", c as u32);
			}
			c => out.push(c),
		}
	}
	out.push('"');
	out
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use super::*;

	#[test]
	fn lua_string_escapes_quotes_and_controls() {
		assert_eq!(lua_string("plain"), r#""plain""#);
		assert_eq!(lua_string(r#"a "b" \c"#), r#""a \"b\" \\c""#);
		assert_eq!(lua_string("x\ny\u{1}"), r#""x\ny\001""#);
	}

	#[test]
	fn every_snippet_filters_editor_windows() {
		let path = PathBuf::from("/tmp/a.lua");
		for lua in [list_windows(), focus_window(1), close_window(2), open_in_window(3, &path, None)] {
			assert!(lua.starts_with("local wins = vim.tbl_filter"));
			assert!(lua.contains(r#"bt ~= "terminal" and bt ~= "nofile""#));
			assert!(lua.contains("cfg.relative == \"\""));
		}
	}

	#[test]
	fn list_windows_returns_json() {
		let lua = list_windows();
		assert!(lua.contains("file = name ~= \"\" and name or \"[empty]\""));
		assert!(lua.trim_end().ends_with("return vim.json.encode(result)"));
	}

	#[test]
	fn focus_and_close_target_the_numbered_window() {
		let focus = focus_window(2);
		assert!(focus.contains("local win = wins[2]"));
		assert!(focus.contains("vim.api.nvim_set_current_win(win)"));
		assert!(focus.contains(r#"return "Focused window 2""#));
		assert!(focus.contains(r#"return "Window 2 not found, only " .. #wins .. " editor windows""#));

		let close = close_window(4);
		assert!(close.contains("local win = wins[4]"));
		assert!(close.contains("vim.api.nvim_win_close(win, false)"));
		assert!(close.contains(r#"return "Closed window 4""#));
	}

	#[test]
	fn open_in_window_escapes_the_path_and_sets_cursor() {
		let lua = open_in_window(1, Path::new(r#"/tmp/we"ird.lua"#), Some(42));
		assert!(lua.contains(r#"vim.fn.fnameescape("/tmp/we\"ird.lua")"#));
		assert!(lua.contains("vim.api.nvim_win_set_cursor(win, {42, 0})"));
		assert!(lua.contains(r#"return "Opened in window 1""#));

		let without_line = open_in_window(1, Path::new("/tmp/a.lua"), None);
		assert!(!without_line.contains("nvim_win_set_cursor"));
	}
}
