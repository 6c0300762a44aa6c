/// Which builtin, if any, a command line names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    None,
    Quit,
    Jobs,
    Bg,
    Fg,
    Kill,
    Nohup,
}

/// A fully parsed command line.
#[derive(Debug)]
pub struct CommandLine {
    pub argv: Vec<String>,
    pub infile: Option<String>,
    pub outfile: Option<String>,
    pub builtin: Builtin,
    pub background: bool,
    /// The original line text, kept verbatim for the job table.
    pub raw: String,
}

/// What the next token will be recorded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSlot {
    Argument,
    Infile,
    Outfile,
}

/// Parse one command line into argv plus redirection targets and the
/// background flag.
///
/// Tokens are whitespace-separated; a token beginning with a single or
/// double quote runs to the matching quote. `<` and `>` mark the next
/// token as the input/output file. A trailing `&` token requests a
/// background job and is stripped from argv.
///
/// Returns `Ok(None)` for a blank line and `Err` with the diagnostic text
/// for a malformed one (the offending line is simply discarded).
pub fn parse(line: &str) -> Result<Option<CommandLine>, String> {
    let raw = line.trim_end_matches('\n').to_string();
    let chars: Vec<char> = raw.chars().collect();

    let mut argv: Vec<String> = Vec::new();
    let mut infile: Option<String> = None;
    let mut outfile: Option<String> = None;
    let mut slot = TokenSlot::Argument;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '<' {
            if infile.is_some() || slot != TokenSlot::Argument {
                return Err("Error: Ambiguous I/O redirection".to_string());
            }
            slot = TokenSlot::Infile;
            i += 1;
            continue;
        }
        if c == '>' {
            if outfile.is_some() || slot != TokenSlot::Argument {
                return Err("Error: Ambiguous I/O redirection".to_string());
            }
            slot = TokenSlot::Outfile;
            i += 1;
            continue;
        }

        // Collect one token, honoring a leading quote.
        let token = if c == '\'' || c == '"' {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != c {
                i += 1;
            }
            if i == chars.len() {
                return Err(format!("Error: unmatched {c}."));
            }
            let token: String = chars[start..i].iter().collect();
            i += 1;
            token
        } else {
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            chars[start..i].iter().collect()
        };

        match slot {
            TokenSlot::Argument => argv.push(token),
            TokenSlot::Infile => infile = Some(token),
            TokenSlot::Outfile => outfile = Some(token),
        }
        slot = TokenSlot::Argument;
    }

    if slot != TokenSlot::Argument {
        return Err("Error: must provide file name for redirection".to_string());
    }

    // Trailing `&` requests a background job.
    let background = match argv.last() {
        Some(last) if last.starts_with('&') => {
            argv.pop();
            true
        }
        _ => false,
    };

    if argv.is_empty() {
        return Ok(None);
    }

    let builtin = match argv[0].as_str() {
        "quit" => Builtin::Quit,
        "jobs" => Builtin::Jobs,
        "bg" => Builtin::Bg,
        "fg" => Builtin::Fg,
        "kill" => Builtin::Kill,
        "nohup" => Builtin::Nohup,
        _ => Builtin::None,
    };

    Ok(Some(CommandLine {
        argv,
        infile,
        outfile,
        builtin,
        background,
        raw,
    }))
}
