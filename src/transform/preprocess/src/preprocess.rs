use std::error;
use std::fmt;
use glt_shared::*;

#[derive(PartialEq, Debug, Clone)]
pub enum PreprocessErrorReason {
    UnknownCommand(String),
    InvalidDefine,
    InvalidUndef,
    ReservedMacroName(String),
    MacroAlreadyDefined(String),
    MacroRequiresArguments,
    MacroArgumentsNeverEnd,
    MacroExpectsDifferentNumberOfArguments,
    InvalidIf(String),
    FailedToParseIfCondition(String),
    InvalidIfdef(String),
    InvalidElse,
    InvalidElif,
    InvalidEndIf,
    ConditionChainNotFinished,
    ElseNotMatched,
    EndIfNotMatched,
    InvalidLine,
    InvalidVersion(String),
    InvalidExtension,
    ExtensionAllCannotBeEnabled,
    RequiredExtensionUnsupported(String),
    ErrorDirective(String),
}

impl PreprocessErrorReason {
    pub fn get_code(&self) -> ErrorCode {
        match *self {
            PreprocessErrorReason::InvalidVersion(_) => ErrorCode::InvalidVersion,
            PreprocessErrorReason::ExtensionAllCannotBeEnabled => ErrorCode::UnknownExtension,
            PreprocessErrorReason::RequiredExtensionUnsupported(_) => {
                ErrorCode::RequiredExtensionUnsupported
            }
            _ => ErrorCode::PreprocessorError,
        }
    }
}

impl fmt::Display for PreprocessErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PreprocessErrorReason::UnknownCommand(ref name) => {
                write!(f, "unknown preprocessor command '{}'", name)
            }
            PreprocessErrorReason::InvalidDefine => write!(f, "invalid #define command"),
            PreprocessErrorReason::InvalidUndef => write!(f, "invalid #undef command"),
            PreprocessErrorReason::ReservedMacroName(ref name) => {
                write!(f, "macro name '{}' is reserved", name)
            }
            PreprocessErrorReason::MacroAlreadyDefined(ref name) => {
                write!(f, "macro '{}' already defined", name)
            }
            PreprocessErrorReason::MacroRequiresArguments => {
                write!(f, "macro function requires arguments")
            }
            PreprocessErrorReason::MacroArgumentsNeverEnd => {
                write!(f, "expected end of macro arguments")
            }
            PreprocessErrorReason::MacroExpectsDifferentNumberOfArguments => {
                write!(f, "macro requires different number of arguments")
            }
            PreprocessErrorReason::InvalidIf(_) => write!(f, "invalid #if"),
            PreprocessErrorReason::FailedToParseIfCondition(ref cond) => {
                write!(f, "#if condition parser failed on '{}'", cond)
            }
            PreprocessErrorReason::InvalidIfdef(_) => write!(f, "invalid #ifdef"),
            PreprocessErrorReason::InvalidElse => write!(f, "invalid #else"),
            PreprocessErrorReason::InvalidElif => write!(f, "invalid #elif"),
            PreprocessErrorReason::InvalidEndIf => write!(f, "invalid #endif"),
            PreprocessErrorReason::ConditionChainNotFinished => {
                write!(f, "not enough #endif's encountered")
            }
            PreprocessErrorReason::ElseNotMatched => {
                write!(f, "encountered #else but with no matching #if")
            }
            PreprocessErrorReason::EndIfNotMatched => {
                write!(f, "encountered #endif but with no matching #if")
            }
            PreprocessErrorReason::InvalidLine => write!(f, "invalid #line"),
            PreprocessErrorReason::InvalidVersion(ref version) => {
                write!(f, "version '{}' is not supported", version)
            }
            PreprocessErrorReason::InvalidExtension => write!(f, "invalid #extension"),
            PreprocessErrorReason::ExtensionAllCannotBeEnabled => {
                write!(f, "'all' can only be used with warn or disable")
            }
            PreprocessErrorReason::RequiredExtensionUnsupported(ref name) => {
                write!(f, "extension '{}' is not supported", name)
            }
            PreprocessErrorReason::ErrorDirective(ref message) => write!(f, "#error {}", message),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct PreprocessError(pub PreprocessErrorReason, pub FileLocation);

impl PreprocessError {
    pub fn get_code(&self) -> ErrorCode {
        self.0.get_code()
    }
}

impl error::Error for PreprocessError {}

impl fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct PreprocessedText {
    code: Vec<u8>,
    debug_locations: LineMap,
    extensions: ExtensionState,
}

impl PreprocessedText {
    fn from_intermediate_text(text: IntermediateText,
                              extensions: ExtensionState)
                              -> PreprocessedText {
        PreprocessedText {
            code: text.buffer.into_bytes(),
            debug_locations: text.debug_locations,
            extensions,
        }
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }
    pub fn get_file_location(&self, stream_location: &StreamLocation) -> Result<FileLocation, ()> {
        self.debug_locations.get_file_location(stream_location)
    }
    /// Extension behavior after every #extension directive was applied
    pub fn extensions(&self) -> &ExtensionState {
        &self.extensions
    }
}

struct IntermediateText {
    buffer: String,
    debug_locations: LineMap,
}

impl IntermediateText {
    fn new() -> IntermediateText {
        IntermediateText {
            buffer: String::new(),
            debug_locations: LineMap { lines: vec![] },
        }
    }
    fn push_str(&mut self, segment: &str, segment_location: FileLocation) {
        let parts = segment.split('\n');
        let last = parts.clone().count() - 1;
        for (index, part) in parts.enumerate() {
            let location = FileLocation(segment_location.0,
                                        Line((segment_location.1).0 + index as u64),
                                        segment_location.2);
            let stream_location_in_buffer = StreamLocation(self.buffer.len() as u64);
            self.buffer.push_str(part);
            if index != last {
                self.buffer.push('\n');
            }
            self.debug_locations.lines.push((stream_location_in_buffer, location));
        }
    }
}

#[derive(Debug)]
struct LineMap {
    lines: Vec<(StreamLocation, FileLocation)>,
}

impl LineMap {
    fn get_file_location(&self, stream_location: &StreamLocation) -> Result<FileLocation, ()> {
        if self.lines.is_empty() {
            return Err(());
        }
        let mut lower = 0;
        let mut upper = self.lines.len();
        while lower < upper - 1 {
            let next_index = (lower + upper) / 2;
            let (ref line_stream, _) = self.lines[next_index];
            if line_stream.0 <= stream_location.0 {
                lower = next_index;
            } else {
                upper = next_index;
            }
        }
        let (ref line_stream, ref line_file) = self.lines[lower];
        let FileLocation(base_file, base_line, base_column) = *line_file;
        let column = Column(base_column.0 + (stream_location.0.saturating_sub(line_stream.0)));
        Ok(FileLocation(base_file, base_line, column))
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(PartialEq, Debug, Clone)]
struct MacroArg(u64);

#[derive(PartialEq, Debug, Clone)]
enum MacroSegment {
    Text(String),
    Arg(MacroArg),
}

impl MacroSegment {
    fn split(self, arg: &str, index: u64, segments: &mut Vec<MacroSegment>) {
        match self {
            MacroSegment::Text(text) => {
                if let Some(sz) = find_macro(&text, arg) {
                    let before = &text[..sz];
                    let after = &text[(sz + arg.len())..];
                    if !before.is_empty() {
                        segments.push(MacroSegment::Text(before.to_string()));
                    }
                    segments.push(MacroSegment::Arg(MacroArg(index)));
                    if !after.is_empty() {
                        MacroSegment::Text(after.to_string()).split(arg, index, segments);
                    }
                    return;
                }
                segments.push(MacroSegment::Text(text))
            }
            MacroSegment::Arg(arg) => segments.push(MacroSegment::Arg(arg)),
        }
    }
}

/// Name, argument count, body and whether the macro was declared with brackets
#[derive(PartialEq, Debug, Clone)]
struct Macro(String, u64, Vec<MacroSegment>, bool);

impl Macro {
    fn from_definition(head: &str, body: &str) -> Result<Macro, PreprocessErrorReason> {
        Ok(match head.find('(') {
            Some(sz) => {
                let name = &head[..sz];
                let mut arg_names = vec![];
                let mut remaining = &head[(sz + 1)..];
                loop {
                    let (sz, last) = match remaining.find(',') {
                        Some(sz) => (sz, false),
                        None => {
                            match remaining.find(')') {
                                Some(sz) => (sz, true),
                                None => return Err(PreprocessErrorReason::InvalidDefine),
                            }
                        }
                    };
                    let arg_name = remaining[..sz].trim();
                    remaining = remaining[(sz + 1)..].trim_start();
                    if !arg_name.chars().all(is_identifier_char) {
                        return Err(PreprocessErrorReason::InvalidDefine);
                    }
                    if !arg_name.is_empty() {
                        arg_names.push(arg_name);
                    }
                    if last {
                        if !remaining.is_empty() {
                            return Err(PreprocessErrorReason::InvalidDefine);
                        }
                        break;
                    }
                }
                let mut last_segments = vec![MacroSegment::Text(body.to_string())];
                for (index, arg_name) in arg_names.iter().enumerate() {
                    let mut next_segments = vec![];
                    for segment in last_segments {
                        segment.split(arg_name, index as u64, &mut next_segments);
                    }
                    last_segments = next_segments;
                }
                Macro(name.to_string(), arg_names.len() as u64, last_segments, true)
            }
            None => Macro(head.to_string(), 0, vec![MacroSegment::Text(body.to_string())], false),
        })
    }

    fn is_function(&self) -> bool {
        self.3
    }
}

#[derive(PartialEq, Debug, Clone)]
enum SubstitutedSegment {
    Text(String, StreamLocation),
    Replaced(String, StreamLocation),
}

fn find_macro(text: &str, name: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(sz) = text[offset..].find(name) {
        let start = offset + sz;
        let end = start + name.len();
        let separated_before = match text[..start].chars().last() {
            Some(c) => !is_identifier_char(c),
            None => true,
        };
        let separated_after = match text[end..].chars().next() {
            Some(c) => !is_identifier_char(c),
            None => true,
        };
        if separated_before && separated_after {
            return Some(start);
        }
        offset = start + text[start..].chars().next().map_or(1, |c| c.len_utf8());
    }
    None
}

/// Split the arguments of a function-like macro use, honouring nested brackets
fn read_macro_args(text: &str) -> Result<(Vec<&str>, &str), PreprocessErrorReason> {
    let mut args = vec![];
    let mut depth = 0;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            ')' => {
                args.push(text[start..index].trim());
                return Ok((args, &text[(index + 1)..]));
            }
            ',' if depth == 0 => {
                args.push(text[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    Err(PreprocessErrorReason::MacroArgumentsNeverEnd)
}

impl SubstitutedSegment {
    fn apply(self,
             macro_def: &Macro,
             macro_defs: &[Macro],
             output: &mut Vec<SubstitutedSegment>)
             -> Result<(), PreprocessErrorReason> {
        match self {
            SubstitutedSegment::Text(text, location) => {
                if let Some(sz) = find_macro(&text, &macro_def.0) {
                    let before = &text[..sz];
                    let remaining = &text[(sz + macro_def.0.len())..];
                    let use_location = StreamLocation(location.0 + sz as u64);

                    let (args, after) = if macro_def.is_function() {
                        let trimmed = remaining.trim_start();
                        if !trimmed.starts_with('(') {
                            return Err(PreprocessErrorReason::MacroRequiresArguments);
                        }
                        let (mut args, after) = read_macro_args(&trimmed[1..])?;
                        // A function-like macro with no parameters is called as NAME()
                        if macro_def.1 == 0 && args.len() == 1 && args[0].is_empty() {
                            args.clear();
                        }
                        (args, after)
                    } else {
                        (vec![], remaining)
                    };

                    if args.len() as u64 != macro_def.1 {
                        return Err(PreprocessErrorReason::MacroExpectsDifferentNumberOfArguments);
                    }

                    let args = args.into_iter()
                        .map(|arg| {
                            let raw_text = SubstitutedText::new(arg, StreamLocation(0));
                            Ok(raw_text.apply_all(macro_defs)?.resolve())
                        })
                        .collect::<Result<Vec<_>, PreprocessErrorReason>>()?;

                    let after_location = StreamLocation(location.0 +
                                                        (text.len() - after.len()) as u64);
                    if !before.is_empty() {
                        output.push(SubstitutedSegment::Text(before.to_string(), location));
                    }
                    let mut replaced_text = String::new();
                    for macro_segment in &macro_def.2 {
                        match *macro_segment {
                            MacroSegment::Text(ref text) => replaced_text.push_str(text),
                            MacroSegment::Arg(MacroArg(index)) => {
                                replaced_text.push_str(&args[index as usize])
                            }
                        }
                    }
                    if !replaced_text.is_empty() {
                        output.push(SubstitutedSegment::Replaced(replaced_text, use_location));
                    }
                    if !after.is_empty() {
                        SubstitutedSegment::Text(after.to_string(), after_location)
                            .apply(macro_def, macro_defs, output)?;
                    }
                    return Ok(());
                }
                output.push(SubstitutedSegment::Text(text, location))
            }
            SubstitutedSegment::Replaced(text, location) => {
                output.push(SubstitutedSegment::Replaced(text, location))
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SubstitutedText(Vec<SubstitutedSegment>);

impl SubstitutedText {
    fn new(text: &str, location: StreamLocation) -> SubstitutedText {
        SubstitutedText(vec![SubstitutedSegment::Text(text.to_string(), location)])
    }

    fn apply_all(self, macro_defs: &[Macro]) -> Result<SubstitutedText, PreprocessErrorReason> {
        let mut segments = Vec::with_capacity(self.0.len());
        for segment in self.0 {
            let mut last_segments = vec![segment];
            for macro_def in macro_defs {
                let mut next_segments = Vec::with_capacity(last_segments.len());
                for substituted_segment in last_segments {
                    substituted_segment.apply(macro_def, macro_defs, &mut next_segments)?;
                }
                last_segments = next_segments;
            }
            segments.append(&mut last_segments);
        }
        Ok(SubstitutedText(segments))
    }

    fn store(self, intermediate_text: &mut IntermediateText, line_map: &LineMap, line_offset: i64) {
        for substituted_segment in self.0 {
            match substituted_segment {
                SubstitutedSegment::Text(text, location) => {
                    let mut remaining = &text[..];
                    let mut loc = location.0;
                    loop {
                        let (sz, last) = match remaining.find('\n') {
                            Some(sz) => (sz + 1, false),
                            None => (remaining.len(), true),
                        };
                        let before = &remaining[..sz];
                        let file_location = remap(line_map, StreamLocation(loc), line_offset);
                        intermediate_text.push_str(before, file_location);
                        remaining = &remaining[sz..];
                        loc += sz as u64;
                        if last {
                            break;
                        }
                    }
                }
                SubstitutedSegment::Replaced(text, location) => {
                    let file_location = remap(line_map, location, line_offset);
                    intermediate_text.push_str(&text, file_location)
                }
            }
        }
    }

    fn resolve(self) -> String {
        let mut output = String::new();
        for substituted_segment in self.0 {
            match substituted_segment {
                SubstitutedSegment::Text(text, _) |
                SubstitutedSegment::Replaced(text, _) => output.push_str(&text),
            }
        }
        output
    }
}

/// Map a position in the source to the line reported for it after #line directives
fn remap(line_map: &LineMap, location: StreamLocation, line_offset: i64) -> FileLocation {
    let FileLocation(file, Line(line), column) = line_map.get_file_location(&location)
        .expect("source line map always covers the source");
    let line = (line as i64 + line_offset).max(0) as u64;
    FileLocation(file, Line(line), column)
}

#[derive(Debug, Clone, Copy)]
struct ConditionBlock {
    active: bool,
    taken: bool,
    seen_else: bool,
}

/// Stores the active #if blocks
struct ConditionChain(Vec<ConditionBlock>);

impl ConditionChain {
    fn new() -> ConditionChain {
        ConditionChain(vec![])
    }

    fn push(&mut self, gate: bool) {
        let parent_active = self.is_active();
        self.0.push(ConditionBlock {
            active: parent_active && gate,
            // An inactive parent means no branch of this block can ever be taken
            taken: gate || !parent_active,
            seen_else: false,
        });
    }

    /// True when an #elif condition needs evaluating
    fn wants_elif(&self) -> bool {
        match self.0.last() {
            Some(block) => !block.taken,
            None => false,
        }
    }

    fn elif(&mut self, gate: bool) -> Result<(), PreprocessErrorReason> {
        match self.0.last_mut() {
            Some(block) if !block.seen_else => {
                block.active = !block.taken && gate;
                block.taken = block.taken || gate;
                Ok(())
            }
            _ => Err(PreprocessErrorReason::InvalidElif),
        }
    }

    fn switch(&mut self) -> Result<(), PreprocessErrorReason> {
        match self.0.last_mut() {
            Some(block) if !block.seen_else => {
                block.active = !block.taken;
                block.taken = true;
                block.seen_else = true;
                Ok(())
            }
            _ => Err(PreprocessErrorReason::ElseNotMatched),
        }
    }

    fn pop(&mut self) -> Result<(), PreprocessErrorReason> {
        match self.0.pop() {
            Some(_) => Ok(()),
            None => Err(PreprocessErrorReason::EndIfNotMatched),
        }
    }

    fn is_active(&self) -> bool {
        self.0.last().map_or(true, |block| block.active)
    }
}

/// Everything a directive may read or change
struct PreprocessState {
    macros: Vec<Macro>,
    condition_chain: ConditionChain,
    extensions: ExtensionState,
    line_offset: i64,
}

fn build_file_linemap(file_contents: &str) -> LineMap {
    let mut line_map = LineMap { lines: vec![] };
    let file_length = file_contents.len() as u64;
    let mut stream = file_contents;
    let mut current_line = 1;
    loop {
        let (sz, final_segment) = match stream.find('\n') {
            Some(sz) => (sz + 1, false),
            None => (stream.len(), true),
        };
        let length_left = stream.len() as u64;
        line_map.lines.push((StreamLocation(file_length - length_left),
                             FileLocation(File::Unknown, Line(current_line), Column(1))));
        current_line += 1;
        stream = &stream[sz..];
        if final_segment {
            break;
        }
    }
    line_map
}

/// Blank out comments while keeping every byte offset and line break in place
fn strip_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                output.push_str("  ");
                chars.next();
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    output.extend(std::iter::repeat(' ').take(next.len_utf8()));
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                output.push_str("  ");
                chars.next();
                let mut last = ' ';
                for next in chars.by_ref() {
                    if next == '\n' {
                        output.push('\n');
                    } else {
                        output.extend(std::iter::repeat(' ').take(next.len_utf8()));
                    }
                    if last == '*' && next == '/' {
                        break;
                    }
                    last = next;
                }
            }
            _ => output.push(c),
        }
    }
    output
}

fn get_line_end(remaining: &str) -> (&str, &str) {
    match remaining.find('\n') {
        Some(sz) => (&remaining[..sz], &remaining[(sz + 1)..]),
        None => (remaining, ""),
    }
}

fn split_command(command: &str) -> (&str, &str) {
    let name_length = command.chars()
        .take_while(|c| is_identifier_char(*c))
        .map(|c| c.len_utf8())
        .sum::<usize>();
    (&command[..name_length], &command[name_length..])
}

fn is_reserved_macro_name(name: &str) -> bool {
    name.starts_with("GL_") || name.contains("__")
}

/// Replace `defined X` and `defined(X)` before the condition sees macro substitution
fn resolve_defined(body: &str, macros: &[Macro]) -> Result<String, PreprocessErrorReason> {
    let mut output = String::new();
    let mut remaining = body;
    while let Some(sz) = find_macro(remaining, "defined") {
        output.push_str(&remaining[..sz]);
        let mut rest = remaining[(sz + 7)..].trim_start();
        let bracketed = rest.starts_with('(');
        if bracketed {
            rest = rest[1..].trim_start();
        }
        let (name, after) = split_command(rest);
        if name.is_empty() {
            return Err(PreprocessErrorReason::InvalidIf(body.to_string()));
        }
        let mut after = after;
        if bracketed {
            after = after.trim_start();
            if !after.starts_with(')') {
                return Err(PreprocessErrorReason::InvalidIf(body.to_string()));
            }
            after = &after[1..];
        }
        let exists = macros.iter().any(|m| m.0 == name);
        output.push_str(if exists { " 1 " } else { " 0 " });
        remaining = after;
    }
    output.push_str(remaining);
    Ok(output)
}

fn evaluate_condition(body: &str, state: &PreprocessState) -> Result<bool, PreprocessErrorReason> {
    let body = body.trim();
    if body.is_empty() {
        return Err(PreprocessErrorReason::InvalidIf(body.to_string()));
    }
    let with_defined = resolve_defined(body, &state.macros)?;
    let resolved = SubstitutedText::new(&with_defined, StreamLocation(0))
        .apply_all(&state.macros)?
        .resolve();
    crate::condition_parser::parse(&resolved)
}

fn process_extension(args: &str, state: &mut PreprocessState) -> Result<(), PreprocessErrorReason> {
    let sz = args.find(':').ok_or(PreprocessErrorReason::InvalidExtension)?;
    let name = args[..sz].trim();
    let behavior_name = args[(sz + 1)..].trim();
    if name.is_empty() || !name.chars().all(is_identifier_char) {
        return Err(PreprocessErrorReason::InvalidExtension);
    }
    let behavior = ExtensionBehavior::from_name(behavior_name)
        .ok_or(PreprocessErrorReason::InvalidExtension)?;
    if name == "all" {
        return match behavior {
            ExtensionBehavior::Warn | ExtensionBehavior::Disable => {
                state.extensions.set_all(behavior);
                Ok(())
            }
            _ => Err(PreprocessErrorReason::ExtensionAllCannotBeEnabled),
        };
    }
    match Extension::from_name(name) {
        Some(extension) if state.extensions.is_supported(extension) => {
            state.extensions.set_behavior(extension, behavior);
            Ok(())
        }
        _ if behavior == ExtensionBehavior::Require => {
            Err(PreprocessErrorReason::RequiredExtensionUnsupported(name.to_string()))
        }
        _ => Ok(()),
    }
}

fn process_line(args: &str,
                location: FileLocation,
                state: &mut PreprocessState)
                -> Result<(), PreprocessErrorReason> {
    let resolved = SubstitutedText::new(args, StreamLocation(0)).apply_all(&state.macros)?.resolve();
    let mut parts = resolved.split_whitespace();
    let line = match parts.next().map(|p| p.parse::<i64>()) {
        Some(Ok(line)) if line >= 0 => line,
        _ => return Err(PreprocessErrorReason::InvalidLine),
    };
    if let Some(source_string) = parts.next() {
        if source_string.parse::<u64>().is_err() {
            return Err(PreprocessErrorReason::InvalidLine);
        }
    }
    if parts.next().is_some() {
        return Err(PreprocessErrorReason::InvalidLine);
    }
    // The line after the directive takes the requested number
    let directive_line = (location.1).0 as i64;
    state.line_offset = line - (directive_line + 1);
    Ok(())
}

fn process_define(args: &str, state: &mut PreprocessState) -> Result<(), PreprocessErrorReason> {
    let args = args.trim_start();
    let (name, remaining) = split_command(args);
    if name.is_empty() {
        return Err(PreprocessErrorReason::InvalidDefine);
    }
    if is_reserved_macro_name(name) {
        return Err(PreprocessErrorReason::ReservedMacroName(name.to_string()));
    }

    // Function-like macros have the bracket directly after the name
    let (header, body) = if remaining.starts_with('(') {
        match remaining.find(')') {
            Some(sz) => (&args[..(name.len() + sz + 1)], &remaining[(sz + 1)..]),
            None => return Err(PreprocessErrorReason::InvalidDefine),
        }
    } else {
        match remaining.chars().next() {
            Some(' ') | Some('\t') | Some('\r') | None => (name, remaining),
            _ => return Err(PreprocessErrorReason::InvalidDefine),
        }
    };

    let body = body.trim();
    let subbed_body = SubstitutedText::new(body, StreamLocation(0))
        .apply_all(&state.macros)?
        .resolve();
    let macro_def = Macro::from_definition(header, &subbed_body)?;

    if state.macros.iter().any(|m| m.0 == macro_def.0) {
        return Err(PreprocessErrorReason::MacroAlreadyDefined(macro_def.0));
    }
    state.macros.push(macro_def);
    Ok(())
}

fn preprocess_command<'a>(command: &'a str,
                          location: FileLocation,
                          state: &mut PreprocessState)
                          -> Result<&'a str, PreprocessErrorReason> {
    let skip = !state.condition_chain.is_active();
    let (name, rest) = split_command(command);
    let (args, remaining) = get_line_end(rest);
    match name {
        "ifdef" | "ifndef" => {
            if skip {
                state.condition_chain.push(false);
                return Ok(remaining);
            }
            let body = args.trim();
            if body.is_empty() || !body.chars().all(is_identifier_char) {
                return Err(PreprocessErrorReason::InvalidIfdef(command.to_string()));
            }
            let exists = state.macros.iter().any(|m| m.0 == body);
            state.condition_chain.push(if name == "ifndef" { !exists } else { exists });
        }
        "if" => {
            if skip {
                state.condition_chain.push(false);
                return Ok(remaining);
            }
            let active = evaluate_condition(args, state)?;
            state.condition_chain.push(active);
        }
        "elif" => {
            if state.condition_chain.wants_elif() {
                let active = evaluate_condition(args, state)?;
                state.condition_chain.elif(active)?;
            } else {
                state.condition_chain.elif(false)?;
            }
        }
        "else" => {
            if !args.trim().is_empty() {
                return Err(PreprocessErrorReason::InvalidElse);
            }
            state.condition_chain.switch()?;
        }
        "endif" => {
            if !args.trim().is_empty() {
                return Err(PreprocessErrorReason::InvalidEndIf);
            }
            state.condition_chain.pop()?;
        }
        _ if skip => {}
        "define" => process_define(args, state)?,
        "undef" => {
            let body = args.trim();
            if body.is_empty() || !body.chars().all(is_identifier_char) {
                return Err(PreprocessErrorReason::InvalidUndef);
            }
            if is_reserved_macro_name(body) {
                return Err(PreprocessErrorReason::ReservedMacroName(body.to_string()));
            }
            state.macros.retain(|m| m.0 != body);
        }
        "extension" => process_extension(args, state)?,
        "line" => process_line(args, location, state)?,
        "version" => {
            let version = args.trim();
            if version != "100" {
                return Err(PreprocessErrorReason::InvalidVersion(version.to_string()));
            }
        }
        "pragma" => {}
        "error" => return Err(PreprocessErrorReason::ErrorDirective(args.trim().to_string())),
        "" if args.trim().is_empty() => {}
        _ => return Err(PreprocessErrorReason::UnknownCommand(name.to_string())),
    }
    Ok(remaining)
}

fn preprocess_file(buffer: &mut IntermediateText,
                   file: &str,
                   state: &mut PreprocessState)
                   -> Result<(), PreprocessError> {

    let line_map = build_file_linemap(file);
    let file_length = file.len() as u64;

    let mut stream = file;
    loop {
        let start_trimmed = stream.trim_start();
        if start_trimmed.starts_with('#') {
            let stream_location = StreamLocation(file_length - start_trimmed.len() as u64);
            let file_location = remap(&line_map, stream_location, state.line_offset);
            let command = start_trimmed[1..].trim_start_matches([' ', '\t']);
            stream = preprocess_command(command, file_location, state)
                .map_err(|reason| PreprocessError(reason, file_location))?;
        } else {

            fn find_region(mut stream: &str) -> (usize, bool) {
                let mut size = 0;
                let mut final_segment;
                loop {
                    let (sz, fs) = match stream.find('\n') {
                        Some(sz) => (sz + 1, false),
                        None => (stream.len(), true),
                    };
                    size += sz;
                    final_segment = fs;
                    stream = &stream[sz..];
                    if final_segment || stream.trim_start_matches([' ', '\t', '\r']).starts_with('#') {
                        break;
                    }
                }
                (size, final_segment)
            }

            let stream_location_in_file = StreamLocation(file_length - stream.len() as u64);
            let (sz, final_segment) = find_region(stream);
            let line = &stream[..sz];
            stream = &stream[sz..];
            if state.condition_chain.is_active() {
                let location = remap(&line_map, stream_location_in_file, state.line_offset);
                SubstitutedText::new(line, stream_location_in_file)
                    .apply_all(&state.macros)
                    .map_err(|reason| PreprocessError(reason, location))?
                    .store(buffer, &line_map, state.line_offset);
            }
            if final_segment {
                break;
            }
        }
        if stream.is_empty() {
            break;
        }
    }

    Ok(())
}

fn predefined_macros(stage: ShaderStage, extensions: &ExtensionState) -> Vec<Macro> {
    let mut macros = vec![Macro::from_definition("GL_ES", "1"),
                          Macro::from_definition("__VERSION__", "100")];
    if stage == ShaderStage::Fragment {
        macros.push(Macro::from_definition("GL_FRAGMENT_PRECISION_HIGH", "1"));
    }
    for extension in extensions.supported() {
        macros.push(Macro::from_definition(extension.name(), "1"));
    }
    macros.into_iter().map(|m| m.expect("predefined macros are well formed")).collect()
}

/// Run the preprocessor over a shader source
pub fn preprocess(input: &str,
                  stage: ShaderStage,
                  extensions: ExtensionState)
                  -> Result<PreprocessedText, PreprocessError> {

    let source = strip_comments(input);
    let mut intermediate_text = IntermediateText::new();
    let mut state = PreprocessState {
        macros: predefined_macros(stage, &extensions),
        condition_chain: ConditionChain::new(),
        extensions,
        line_offset: 0,
    };
    preprocess_file(&mut intermediate_text, &source, &mut state)?;

    if !state.condition_chain.0.is_empty() {
        let last_line = source.lines().count() as u64;
        let location = FileLocation(File::Unknown, Line(last_line), Column(1));
        return Err(PreprocessError(PreprocessErrorReason::ConditionChainNotFinished, location));
    }

    Ok(PreprocessedText::from_intermediate_text(intermediate_text, state.extensions))
}

/// Preprocess a fragment shader with no extensions available
pub fn preprocess_single(input: &str) -> Result<PreprocessedText, PreprocessError> {
    let options = TranslateOptions::empty();
    preprocess(input,
               ShaderStage::Fragment,
               ExtensionState::new(ShaderStage::Fragment, options))
}

#[test]
fn macro_from_definition() {
    assert_eq!(Macro::from_definition("B", "0").unwrap(),
               Macro("B".to_string(), 0, vec![MacroSegment::Text("0".to_string())], false));
    assert_eq!(Macro::from_definition("B(x)", "x").unwrap(),
               Macro("B".to_string(), 1, vec![MacroSegment::Arg(MacroArg(0))], true));
    assert_eq!(Macro::from_definition("B(x,y)", "y").unwrap(),
               Macro("B".to_string(), 2, vec![MacroSegment::Arg(MacroArg(1))], true));
    assert_eq!(Macro::from_definition("B()", "1").unwrap(),
               Macro("B".to_string(), 0, vec![MacroSegment::Text("1".to_string())], true));
    assert_eq!(Macro::from_definition("B(x,xy)", "(x || xy)").unwrap(),
               Macro("B".to_string(),
                     2,
                     vec![MacroSegment::Text("(".to_string()),
                          MacroSegment::Arg(MacroArg(0)),
                          MacroSegment::Text(" || ".to_string()),
                          MacroSegment::Arg(MacroArg(1)),
                          MacroSegment::Text(")".to_string())],
                     true));
}

#[test]
fn macro_resolve() {
    fn run(input: &str, macros: &[Macro], expected_output: &str) {
        let text = SubstitutedText::new(input, StreamLocation(0));
        let resolved_text = text.apply_all(macros).unwrap().resolve();
        assert_eq!(resolved_text, expected_output);
    }

    run("(A || B) && BC",
        &[Macro::from_definition("B", "0").unwrap(), Macro::from_definition("BC", "1").unwrap()],
        "(A || 0) && 1");

    run("(A || B(0, 1)) && BC",
        &[Macro::from_definition("B(x, y)", "(x && y)").unwrap(),
          Macro::from_definition("BC", "1").unwrap()],
        "(A || (0 && 1)) && 1");

    run("B(f(1, 2), 3)",
        &[Macro::from_definition("B(x, y)", "x + y").unwrap()],
        "f(1, 2) + 3");
}

#[test]
fn test_empty() {
    assert_eq!(preprocess_single("").unwrap().code, b"");
    assert_eq!(preprocess_single("test").unwrap().code, b"test");
    assert_eq!(preprocess_single("t1\nt2").unwrap().code, b"t1\nt2");
}

#[test]
fn test_define() {
    let pp = preprocess_single;
    assert_eq!(pp("#define X 0\nX").unwrap().code, b"0");
    assert_eq!(pp("#define X 0\nX X").unwrap().code, b"0 0");
    assert_eq!(pp("#define X 2\n#define Y X\nY").unwrap().code, b"2");
    assert_eq!(pp("#define X(a) a\nX(2)").unwrap().code, b"2");
    assert_eq!(pp("#define X(a,b) a+b\nX(2,3)").unwrap().code, b"2+3");
    assert_eq!(pp("#define X").unwrap().code, b"");
    assert_eq!(pp("#define X 0\n#define XY 1\nXY X").unwrap().code, b"1 0");
    assert_eq!(pp("#define X 0\n#undef X\nX").unwrap().code, b"X");
    assert_eq!(pp("GL_ES").unwrap().code, b"1");
    assert_eq!(pp("__VERSION__").unwrap().code, b"100");
    assert!(pp("#define X 0\n#define X 1\n").is_err());
    assert_eq!(pp("#define GL_X 1\n").unwrap_err().0,
               PreprocessErrorReason::ReservedMacroName("GL_X".to_string()));
    assert_eq!(pp("#define A__B 1\n").unwrap_err().get_code(),
               ErrorCode::PreprocessorError);
}

#[test]
fn test_condition() {
    let pp = preprocess_single;
    assert!(pp("#if 0\nX").is_err());
    assert_eq!(pp("#if 0\nX\n#endif").unwrap().code, b"");
    assert_eq!(pp("#if 1\nX\n#endif").unwrap().code, b"X\n");
    assert_eq!(pp("#if 0\nX\n#else\nY\n#endif").unwrap().code, b"Y\n");
    assert_eq!(pp("#if 1\nX\n#else\nY\n#endif").unwrap().code, b"X\n");
    assert_eq!(pp("#if 0\nX\n#elif 1\nY\n#else\nZ\n#endif").unwrap().code, b"Y\n");
    assert_eq!(pp("#if 1\nX\n#elif 1\nY\n#endif").unwrap().code, b"X\n");
    assert_eq!(pp("#ifdef GL_ES\nX\n#else\nY\n#endif").unwrap().code, b"X\n");
    assert_eq!(pp("#ifndef GL_ES\nX\n#else\nY\n#endif").unwrap().code, b"Y\n");
    assert_eq!(pp("#if defined(GL_ES) && __VERSION__ >= 100\nX\n#endif").unwrap().code,
               b"X\n");
    assert_eq!(pp("#if defined UNKNOWN\nX\n#endif").unwrap().code, b"");
    assert_eq!(pp("#if 0\n#if 1\nX\n#else\nY\n#endif\n#endif").unwrap().code, b"");
    assert_eq!(pp("#if 0\n#define X Y\n#endif\nX").unwrap().code, b"X");
    assert_eq!(pp("#if 0\n#unknown\n#endif\nX").unwrap().code, b"X");
    assert_eq!(pp("#if 1 // comment\nX\n#endif // comment\n").unwrap().code, b"X\n");
    assert!(pp("#else\n").is_err());
    assert!(pp("#endif\n").is_err());
}

#[test]
fn test_comments() {
    let pp = preprocess_single;
    assert_eq!(pp("a // b\nc").unwrap().code, b"a     \nc");
    assert_eq!(pp("a /* b\n */ c").unwrap().code, b"a     \n    c");
}

#[test]
fn test_line() {
    let text = preprocess_single("a\n#line 10\nb\nc").unwrap();
    let position = text.as_bytes().iter().position(|b| *b == b'c').unwrap();
    let location = text.get_file_location(&StreamLocation(position as u64)).unwrap();
    assert_eq!(location.line(), 11);
    let start = text.get_file_location(&StreamLocation(0)).unwrap();
    assert_eq!(start.line(), 1);
}

#[test]
fn test_directives() {
    let pp = preprocess_single;
    assert!(pp("#version 100\nX").is_ok());
    assert_eq!(pp("#version 300 es\n").unwrap_err().get_code(), ErrorCode::InvalidVersion);
    assert_eq!(pp("#pragma optimize(on)\nX").unwrap().code, b"X");
    assert_eq!(pp("#error stop\n").unwrap_err().0,
               PreprocessErrorReason::ErrorDirective("stop".to_string()));
    let error = pp("\n\n#foo\n").unwrap_err();
    assert_eq!(error.1.line(), 3);
}

#[test]
fn test_extension() {
    let pp = preprocess_single;
    assert_eq!(pp("#extension all : enable\n").unwrap_err().get_code(),
               ErrorCode::UnknownExtension);
    assert!(pp("#extension all : disable\n").is_ok());
    assert!(pp("#extension GL_foo : enable\n").is_ok());
    assert_eq!(pp("#extension GL_foo : require\n").unwrap_err().get_code(),
               ErrorCode::RequiredExtensionUnsupported);
    assert_eq!(pp("#extension GL_OES_standard_derivatives : require\n").unwrap_err().get_code(),
               ErrorCode::RequiredExtensionUnsupported);
    assert_eq!(pp("#extension GL_foo : sometimes\n").unwrap_err().get_code(),
               ErrorCode::PreprocessorError);

    let options = TranslateOptions::ENABLE_STANDARD_DERIVATIVES;
    let extensions = ExtensionState::new(ShaderStage::Fragment, options);
    let text = preprocess("#extension GL_OES_standard_derivatives : enable\n\
                           #ifdef GL_OES_standard_derivatives\nX\n#endif",
                          ShaderStage::Fragment,
                          extensions)
        .unwrap();
    assert_eq!(text.code, b"X\n");
    assert!(text.extensions().is_enabled(Extension::StandardDerivatives));
}
