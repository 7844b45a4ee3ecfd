/// One line of user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Parts,
    Part(PartRef),
    /// 1-based, as printed by `parts`.
    Material(usize),
    Catalog(String),
    Model(String),
    Status,
    Help,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartRef {
    Name(String),
    /// `#n`, 1-based.
    Position(usize),
}

pub const HELP: &str = "\
commands:
  parts              list parts and their materials
  part <name|#n>     select a part by name or by number
  material <n>       apply material n of the selected part
  catalog <source>   load a material catalog (path or URL)
  model <source>     load a model (path or URL)
  status             show scene, catalog and selection
  help               this text
  quit               exit";

impl Command {
    /// `Ok(None)` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("# ") || line == "#" {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "parts" | "ls" => Command::Parts,
            "part" | "p" => Command::Part(parse_part_ref(rest)?),
            "material" | "m" => Command::Material(parse_number(rest)?),
            "catalog" => Command::Catalog(required(word, rest)?),
            "model" => Command::Model(required(word, rest)?),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(Some(command))
    }
}

fn required(word: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("'{word}' needs a source"))
    } else {
        Ok(rest.to_string())
    }
}

fn parse_number(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("expected a number from 1, got '{text}'")),
        Ok(n) => Ok(n),
    }
}

fn parse_part_ref(rest: &str) -> Result<PartRef, String> {
    match rest.strip_prefix('#') {
        Some(number) => parse_number(number).map(PartRef::Position),
        // Empty part names are valid, `part ""` selects one
        None if rest == "\"\"" => Ok(PartRef::Name(String::new())),
        None if rest.is_empty() => Err("'part' needs a name or #number".into()),
        None => Ok(PartRef::Name(rest.to_string())),
    }
}
