/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! The macro expansion driver and the built-in macro handlers.
//!
//! [`Expander::expand`] scans its input left to right for `#NAME` invocations
//! (a `#` followed by one or more uppercase ASCII letters), dispatches the
//! name to a handler, splices the handler's output into the text and resumes
//! scanning from the start of the spliced text, so that macros emitted by
//! other macros are themselves expanded.
//!
//! Handlers receive the tail of the text following the macro name and return
//! the replacement for that entire tail: their own output followed by
//! whatever input they did not consume.
use core::convert::TryFrom;
use std::collections::HashMap;

use log::warn;
use memchr::memchr_iter;

use crate::ExpandError;
use crate::eval;
use crate::memory::{EmptyStackError, Memory};
use crate::params::{find_closing, is_custom_delimiter, matching_delimiter, scan_int,
                    split_top_level};

/// An argument passed to a `#CALL` method.
///
/// Arguments that evaluate as arithmetic expressions are passed as integers,
/// anything else is passed verbatim, and omitted arguments are [`Empty`].
///
/// [`Empty`]: CallArg::Empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Int(i64),
    Str(String),
    Empty,
}

type CallMethod = Box<dyn Fn(&[CallArg]) -> Result<String, String>>;

/// The macro expansion engine.
///
/// Owns the memory image inspected by `#PEEK` and mutated by `#POKES`, the
/// snapshot stack driven by `#PUSHS`/`#POPS`, and the method registry used
/// by `#CALL`.
pub struct Expander {
    memory: Memory,
    snapshots: Vec<(String, Memory)>,
    methods: HashMap<String, CallMethod>,
    variables: HashMap<String, String>,
}

impl Default for Expander {
    fn default() -> Self {
        Expander::with_memory(Memory::default())
    }
}

struct IntArgs {
    values: Vec<i64>,
    /// The parameter text consumed, quoted by error messages.
    consumed: String,
    /// The unconsumed remainder of the handler's input.
    rest: String,
}

struct StringBlock {
    items: Vec<String>,
    /// The raw block text, delimiters included.
    raw: String,
    rest: String,
}

impl Expander {
    pub fn new() -> Self {
        Expander::default()
    }

    pub fn with_memory(memory: Memory) -> Self {
        Expander {
            memory,
            snapshots: Vec::new(),
            methods: HashMap::new(),
            variables: HashMap::new(),
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Registers a method that `#CALL:name(...)` dispatches to.
    pub fn register_method<F>(&mut self, name: &str, method: F)
        where F: Fn(&[CallArg]) -> Result<String, String> + 'static
    {
        self.methods.insert(name.to_string(), Box::new(method));
    }

    /// Defines a plain variable. A variable name is recognized by `#CALL`
    /// but rejected as uncallable.
    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_string(), value.to_string());
    }

    /// Saves a copy of the memory image on the snapshot stack.
    pub fn push_snapshot(&mut self, name: &str) {
        self.snapshots.push((name.to_string(), self.memory.clone()));
    }

    /// Restores and removes the most recently pushed memory image.
    pub fn pop_snapshot(&mut self) -> Result<(), EmptyStackError> {
        let (_, memory) = self.snapshots.pop().ok_or(EmptyStackError)?;
        self.memory = memory;
        Ok(())
    }

    /// Expands every macro invocation in `source`.
    pub fn expand(&mut self, source: &str) -> Result<String, ExpandError> {
        let mut text = source.to_string();
        let mut pos = 0;
        while let Some(at) = find_invocation(&text, pos) {
            let replacement = self.expand_invocation(&text[at..])?;
            text.truncate(at);
            text.push_str(&replacement);
            pos = at;
        }
        Ok(text)
    }

    /// Expands the single invocation at the start of `tail`, returning the
    /// replacement for the whole of `tail`.
    fn expand_invocation(&mut self, tail: &str) -> Result<String, ExpandError> {
        let name_len = tail[1..].bytes().take_while(u8::is_ascii_uppercase).count();
        let name = &tail[1..1 + name_len];
        let work = tail[1 + name_len..].to_string();
        match name {
            "CALL" => self.mac_call(&work),
            "CHR" => self.mac_chr(&work),
            "EVAL" => self.mac_eval(&work),
            "FOR" => self.mac_for(&work),
            "FOREACH" => self.mac_foreach(&work),
            "HTML" => self.mac_html(&work),
            "IF" => self.mac_if(&work),
            "MAP" => self.mac_map(&work),
            "PEEK" => self.mac_peek(&work),
            "POKES" => self.mac_pokes(&work),
            "POPS" => self.mac_pops(&work),
            "PUSHS" => self.mac_pushs(&work),
            "SPACE" => self.mac_space(&work),
            _ => Err(ExpandError::UnknownMacro(name.to_string())),
        }
    }

    /// Parses a macro's integer parameters from the start of `work`.
    ///
    /// A parenthesized block holds full arithmetic expressions, one per
    /// top-level comma-separated field, and is macro-expanded before
    /// splitting. Otherwise plain integer literals are scanned directly,
    /// with a nested invocation at a field position expanded in place; the
    /// scan stops at the first character that cannot continue the list.
    /// Empty fields take their values from `defaults`, which covers the
    /// optional parameters after the first `required` ones.
    fn parse_ints(&mut self, name: &'static str, work: &str, required: usize,
                  defaults: &[i64]) -> Result<IntArgs, ExpandError>
    {
        if work.as_bytes().first() == Some(&b'(') {
            let close = find_closing(work, 0).ok_or_else(|| {
                ExpandError::new(name, format!("No closing bracket: {}", work))
            })?;
            let content = self.expand(&work[1..close])?;
            let fields = split_top_level(&content, b',');
            let mut parsed: Vec<Option<i64>> = Vec::with_capacity(fields.len());
            for field in &fields {
                if field.trim().is_empty() {
                    parsed.push(None);
                }
                else {
                    let value = eval::eval(field).map_err(|_| {
                        ExpandError::new(name, format!(
                            "Cannot parse integer '{}' in parameter string: '{}'", field, content))
                    })?;
                    parsed.push(Some(value));
                }
            }
            if parsed.iter().all(Option::is_none) {
                parsed.clear();
            }
            let rest = work[close + 1..].to_string();
            return fill_values(name, parsed, required, defaults, content, rest);
        }
        // Unbracketed: scan the list in a working copy of the tail, splicing
        // in the expansion of any nested invocation met at a field position.
        // The scan stops once the macro's fields are full, leaving trailing
        // `,...` text to the enclosing context.
        let total = required + defaults.len();
        let mut work = work.to_string();
        let mut pos = 0;
        let mut parsed: Vec<Option<i64>> = Vec::new();
        loop {
            while find_invocation(&work, pos) == Some(pos) {
                let replacement = self.expand_invocation(&work[pos..])?;
                work.truncate(pos);
                work.push_str(&replacement);
            }
            match scan_int(&work, pos) {
                Some((end, value)) => {
                    parsed.push(Some(value));
                    pos = end;
                }
                None => parsed.push(None)
            }
            if parsed.len() == total {
                break;
            }
            if work.as_bytes().get(pos) == Some(&b',') {
                pos += 1;
            }
            else {
                break;
            }
        }
        if pos == 0 {
            parsed.clear();
        }
        let consumed = work[..pos].to_string();
        let rest = work[pos..].to_string();
        fill_values(name, parsed, required, defaults, consumed, rest)
    }

    /// Parses a delimited list of strings from the start of `work`.
    ///
    /// The block is either bracketed, with items split on top-level commas,
    /// or uses the custom form `dsitem1sitem2s...sd` with a delimiter
    /// character `d` and a separator character `s`. Returns `Ok(None)` when
    /// `work` does not start with a block at all.
    fn parse_string_block(&mut self, name: &'static str, work: &str, expand_content: bool)
        -> Result<Option<StringBlock>, ExpandError>
    {
        let mut chars = work.chars();
        let open = match chars.next() {
            Some(c) => c,
            None => return Ok(None)
        };
        if open.is_ascii() && matching_delimiter(open as u8).is_some() {
            let close = find_closing(work, 0).ok_or_else(|| {
                ExpandError::new(name, format!("No closing bracket: {}", work))
            })?;
            let mut content = work[1..close].to_string();
            if expand_content {
                content = self.expand(&content)?;
            }
            let items = split_top_level(&content, b',').iter()
                                                       .map(|s| s.to_string())
                                                       .collect();
            return Ok(Some(StringBlock {
                items,
                raw: work[..=close].to_string(),
                rest: work[close + 1..].to_string(),
            }));
        }
        if !is_custom_delimiter(open) {
            return Ok(None);
        }
        let sep = match chars.next() {
            Some(c) => c,
            None => return Err(ExpandError::new(name,
                format!("No terminating delimiter: {}", work)))
        };
        let start = open.len_utf8() + sep.len_utf8();
        let term: String = [sep, open].iter().collect();
        let terminator = work[start..].find(&term)
            .ok_or_else(|| ExpandError::new(name,
                format!("No terminating delimiter: {}", work)))?;
        let mut content = work[start..start + terminator].to_string();
        if expand_content {
            content = self.expand(&content)?;
        }
        let items = content.split(sep).map(str::to_string).collect();
        let after = start + terminator + term.len();
        Ok(Some(StringBlock {
            items,
            raw: work[..after].to_string(),
            rest: work[after..].to_string(),
        }))
    }

    /// Parses a single text parameter: a bracketed block, or a delimiter
    /// character followed by text up to its next occurrence.
    fn parse_text_param(&mut self, name: &'static str, work: &str)
        -> Result<(String, String), ExpandError>
    {
        let open = match work.chars().next() {
            Some(c) if !c.is_alphanumeric() && !c.is_whitespace() => c,
            _ => return Err(ExpandError::new(name, "No text parameter"))
        };
        if open.is_ascii() && matching_delimiter(open as u8).is_some() {
            let close = find_closing(work, 0).ok_or_else(|| {
                ExpandError::new(name, format!("No closing bracket: {}", work))
            })?;
            return Ok((work[1..close].to_string(), work[close + 1..].to_string()));
        }
        let start = open.len_utf8();
        let end = work[start..].find(open).ok_or_else(|| {
            ExpandError::new(name, format!("No terminating delimiter: {}", work))
        })?;
        Ok((work[start..start + end].to_string(),
            work[start + end + open.len_utf8()..].to_string()))
    }

    fn mac_call(&mut self, work: &str) -> Result<String, ExpandError> {
        let mut chars = work.chars();
        match chars.next() {
            None => return Err(ExpandError::new("CALL", "No parameters")),
            Some(':') => {}
            Some(c) => return Err(ExpandError::new("CALL",
                format!("Malformed macro: #CALL{}...", c)))
        }
        let name_len = work[1..].bytes()
                                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                                .count();
        if name_len == 0 {
            return Err(ExpandError::new("CALL", "No method name"));
        }
        let name = work[1..1 + name_len].to_string();
        let args_text = &work[1 + name_len..];
        if args_text.as_bytes().first() != Some(&b'(') {
            return Err(ExpandError::new("CALL",
                format!("No argument list specified: #CALL:{}", name)));
        }
        let close = find_closing(args_text, 0).ok_or_else(|| {
            ExpandError::new("CALL", format!("No closing bracket: {}", args_text))
        })?;
        let content = self.expand(&args_text[1..close])?;
        let args: Vec<CallArg> = if content.is_empty() {
            Vec::new()
        }
        else {
            split_top_level(&content, b',').iter().map(|field| {
                if field.is_empty() {
                    CallArg::Empty
                }
                else {
                    match eval::eval(field) {
                        Ok(value) => CallArg::Int(value),
                        Err(_) => CallArg::Str(field.to_string())
                    }
                }
            }).collect()
        };
        let output = if let Some(method) = self.methods.get(&name) {
            method(&args).map_err(|message| ExpandError::new("CALL", message))?
        }
        else if self.variables.contains_key(&name) {
            return Err(ExpandError::new("CALL",
                format!("Uncallable method name: {}", name)));
        }
        else {
            warn!("Unknown method name in #CALL macro: {}", name);
            String::new()
        };
        Ok(output + &args_text[close + 1..])
    }

    fn mac_chr(&mut self, work: &str) -> Result<String, ExpandError> {
        let args = self.parse_ints("CHR", work, 1, &[])?;
        let code = args.values[0];
        let ch = u32::try_from(code).ok().and_then(char::from_u32).ok_or_else(|| {
            ExpandError::new("CHR", format!("Invalid character code: {}", code))
        })?;
        Ok(ch.to_string() + &args.rest)
    }

    fn mac_eval(&mut self, work: &str) -> Result<String, ExpandError> {
        let args = self.parse_ints("EVAL", work, 1, &[10, 1])?;
        let (value, base, width) = (args.values[0], args.values[1], args.values[2]);
        let width = usize::try_from(width).unwrap_or(0);
        let output = match base {
            2 => format!("{:0width$b}", value, width = width),
            10 => format!("{:0width$}", value, width = width),
            16 => format!("{:0width$X}", value, width = width),
            _ => return Err(ExpandError::new("EVAL",
                format!("Invalid base ({}): {}", base, args.consumed)))
        };
        Ok(output + &args.rest)
    }

    fn mac_for(&mut self, work: &str) -> Result<String, ExpandError> {
        let (defer, work) = match work.strip_prefix(':') {
            Some(rest) => (true, rest),
            None => (false, work)
        };
        let args = self.parse_ints("FOR", work, 2, &[1])?;
        let (start, stop, step) = (args.values[0], args.values[1], args.values[2]);
        let block = self.parse_string_block("FOR", &args.rest, !defer)?
            .ok_or_else(|| ExpandError::new("FOR",
                format!("No variable name: {}", args.consumed)))?;
        if block.items[0].is_empty() {
            return Err(ExpandError::new("FOR",
                format!("No variable name: {}{}", args.consumed, block.raw)));
        }
        if step == 0 {
            return Err(ExpandError::new("FOR",
                format!("Invalid step (0): {}", args.consumed)));
        }
        let mut values = Vec::new();
        let mut n = start;
        while if step > 0 { n <= stop } else { n >= stop } {
            values.push(n.to_string());
            n += step;
        }
        let output = substitute_and_join(&block.items, &values);
        Ok(output + &block.rest)
    }

    fn mac_foreach(&mut self, work: &str) -> Result<String, ExpandError> {
        let (defer, work) = match work.strip_prefix(':') {
            Some(rest) => (true, rest),
            None => (false, work)
        };
        let StringBlock { items: mut values, raw: values_raw, rest: values_rest } =
            self.parse_string_block("FOREACH", work, !defer)?
                .ok_or_else(|| ExpandError::new("FOREACH", "No values"))?;
        if values.len() == 1 && values[0].is_empty() {
            values.clear();
        }
        let block = self.parse_string_block("FOREACH", &values_rest, !defer)?
            .ok_or_else(|| ExpandError::new("FOREACH",
                format!("No variable name: {}", values_raw)))?;
        if block.items[0].is_empty() {
            return Err(ExpandError::new("FOREACH",
                format!("No variable name: {}{}", values_raw, block.raw)));
        }
        let output = substitute_and_join(&block.items, &values);
        Ok(output + &block.rest)
    }

    fn mac_html(&mut self, work: &str) -> Result<String, ExpandError> {
        let (content, rest) = self.parse_text_param("HTML", work)?;
        Ok(self.expand(&content)? + &rest)
    }

    fn mac_if(&mut self, work: &str) -> Result<String, ExpandError> {
        let (value, consumed, rest) = if work.as_bytes().first() == Some(&b'(') {
            let close = find_closing(work, 0).ok_or_else(|| {
                ExpandError::new("IF", format!("No closing bracket: {}", work))
            })?;
            let consumed = &work[..=close];
            let content = self.expand(&work[1..close])?;
            let value = eval::eval(&content).map_err(|_| ExpandError::new("IF",
                format!("No valid expression found: '#IF{}'", consumed)))?;
            (value, consumed, &work[close + 1..])
        }
        else {
            match scan_int(work, 0) {
                Some((end, value)) => (value, &work[..end], &work[end..]),
                None => {
                    let word = work.bytes()
                                   .take_while(|b| b.is_ascii_alphanumeric() ||
                                                   matches!(*b, b'_' | b'$'))
                                   .count();
                    return Err(ExpandError::new("IF",
                        format!("No valid expression found: '#IF{}'", &work[..word])));
                }
            }
        };
        let block = self.parse_string_block("IF", rest, true)?
            .ok_or_else(|| ExpandError::new("IF",
                format!("No output strings: {}", consumed)))?;
        if block.items.len() > 2 {
            return Err(ExpandError::new("IF",
                format!("Too many output strings (expected 2): {}{}", consumed, block.raw)));
        }
        let output = if value != 0 {
            block.items[0].clone()
        }
        else {
            block.items.get(1).cloned().unwrap_or_default()
        };
        Ok(output + &block.rest)
    }

    fn mac_map(&mut self, work: &str) -> Result<String, ExpandError> {
        let args = self.parse_ints("MAP", work, 1, &[])?;
        let value = args.values[0];
        let block = self.parse_string_block("MAP", &args.rest, true)?
            .ok_or_else(|| ExpandError::new("MAP",
                format!("No mappings provided: {}", args.consumed)))?;
        let mut output = block.items[0].clone();
        for item in &block.items[1..] {
            let (key_text, mapped) = match item.find(':') {
                Some(colon) => (&item[..colon], &item[colon + 1..]),
                None => (item.as_str(), item.as_str())
            };
            let key = eval::eval(key_text).map_err(|_| ExpandError::new("MAP",
                format!("Invalid key ({}): {}", key_text, block.raw)))?;
            if key == value {
                output = mapped.to_string();
                break;
            }
        }
        Ok(output + &block.rest)
    }

    fn mac_peek(&mut self, work: &str) -> Result<String, ExpandError> {
        let args = self.parse_ints("PEEK", work, 1, &[])?;
        Ok(self.memory.peek(args.values[0]).to_string() + &args.rest)
    }

    fn mac_pokes(&mut self, work: &str) -> Result<String, ExpandError> {
        let mut rest = work.to_string();
        loop {
            let args = self.parse_ints("POKES", &rest, 2, &[1, 1])?;
            let (addr, byte, length, step) = (args.values[0], args.values[1],
                                              args.values[2], args.values[3]);
            for i in 0..length.max(0) {
                self.memory.poke(addr.wrapping_add(i.wrapping_mul(step)), byte as u8);
            }
            match args.rest.strip_prefix(';') {
                Some(next) => rest = next.to_string(),
                None => return Ok(args.rest)
            }
        }
    }

    fn mac_pops(&mut self, work: &str) -> Result<String, ExpandError> {
        self.pop_snapshot().map_err(|e| ExpandError::new("POPS", e.to_string()))?;
        Ok(work.to_string())
    }

    fn mac_pushs(&mut self, work: &str) -> Result<String, ExpandError> {
        let name_len = work.bytes()
                           .take_while(|b| b.is_ascii_alphanumeric() ||
                                           matches!(*b, b'_' | b'$' | b'#'))
                           .count();
        self.push_snapshot(&work[..name_len]);
        Ok(work[name_len..].to_string())
    }

    fn mac_space(&mut self, work: &str) -> Result<String, ExpandError> {
        let args = self.parse_ints("SPACE", work, 0, &[1])?;
        let count = usize::try_from(args.values[0]).unwrap_or(0);
        Ok(" ".repeat(count) + &args.rest)
    }
}

/// Finds the next invocation at or after `from`: a `#` directly followed by
/// an uppercase ASCII letter.
fn find_invocation(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    memchr_iter(b'#', &bytes[from..])
        .map(|i| from + i)
        .find(|&i| matches!(bytes.get(i + 1), Some(b) if b.is_ascii_uppercase()))
}

/// Substitutes loop values for the variable name in a `#FOR`/`#FOREACH`
/// body block (`var,string[,sep[,fsep]]`) and joins the results.
fn substitute_and_join(items: &[String], values: &[String]) -> String {
    let var = &items[0];
    let body = items.get(1).map(String::as_str).unwrap_or("");
    let sep = items.get(2).map(String::as_str).unwrap_or("");
    let fsep = items.get(3).map(String::as_str);
    let strings: Vec<String> = values.iter().map(|v| body.replace(var.as_str(), v)).collect();
    match (strings.len(), fsep) {
        (0, _) => String::new(),
        (1, _) => strings.into_iter().next().unwrap(),
        (n, Some(fsep)) => format!("{}{}{}", strings[..n - 1].join(sep), fsep, strings[n - 1]),
        (_, None) => strings.join(sep)
    }
}

fn fill_values(name: &'static str, parsed: Vec<Option<i64>>, required: usize,
               defaults: &[i64], consumed: String, rest: String)
    -> Result<IntArgs, ExpandError>
{
    let total = required + defaults.len();
    if parsed.is_empty() {
        if required > 0 {
            return Err(ExpandError::new(name,
                format!("No parameters (expected {})", required)));
        }
        return Ok(IntArgs { values: defaults.to_vec(), consumed, rest });
    }
    if parsed.len() > total {
        return Err(ExpandError::new(name,
            format!("Too many parameters (expected {}): '{}'", total, consumed)));
    }
    let mut values = Vec::with_capacity(total);
    for i in 0..total {
        match parsed.get(i).copied().flatten() {
            Some(value) => values.push(value),
            None if i >= required => values.push(defaults[i - required]),
            None => return Err(ExpandError::new(name,
                format!("Not enough parameters (expected {}): '{}'", required, consumed)))
        }
    }
    Ok(IntArgs { values, consumed, rest })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocations_need_an_uppercase_name() {
        assert_eq!(find_invocation("a # b #x #IF", 0), Some(9));
        assert_eq!(find_invocation("#PEEK0", 0), Some(0));
        assert_eq!(find_invocation("no macros here", 0), None);
    }

    #[test]
    fn unbracketed_scan_stops_at_first_non_list_character() {
        let mut expander = Expander::new();
        let args = expander.parse_ints("EVAL", "5,,5)x", 1, &[10, 1]).unwrap();
        assert_eq!(args.values, vec![5, 10, 5]);
        assert_eq!(args.consumed, "5,,5");
        assert_eq!(args.rest, ")x");
    }

    #[test]
    fn unbracketed_scan_stops_when_the_fields_are_full() {
        let mut expander = Expander::new();
        let args = expander.parse_ints("PEEK", "32768,16,2)", 1, &[]).unwrap();
        assert_eq!(args.values, vec![32768]);
        assert_eq!(args.consumed, "32768");
        assert_eq!(args.rest, ",16,2)");
    }

    #[test]
    fn bracketed_fields_are_full_expressions() {
        let mut expander = Expander::new();
        let args = expander.parse_ints("EVAL", "(1+1, 4*4)tail", 1, &[10, 1]).unwrap();
        assert_eq!(args.values, vec![2, 16, 1]);
        assert_eq!(args.rest, "tail");
    }

    #[test]
    fn custom_delimiter_blocks() {
        let mut expander = Expander::new();
        let block = expander.parse_string_block("FOR", "//n/, (n)//13", true)
                            .unwrap()
                            .unwrap();
        assert_eq!(block.items, vec!["n", ", (n)"]);
        assert_eq!(block.raw, "//n/, (n)//");
        assert_eq!(block.rest, "13");
    }
}
