use std::collections::HashSet;

// ---------------------------------------------------------------------------
// `#if` condition expressions
// ---------------------------------------------------------------------------
//
// expr  := and ('||' and)*
// and   := unary ('&&' unary)*
// unary := '!' unary | '(' expr ')' | IDENT

#[derive(Debug, Clone, PartialEq)]
enum CondToken {
    Ident(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

/// Evaluate a conditional-compilation expression against the defined symbols.
pub fn evaluate(expr: &str, defines: &HashSet<String>) -> Result<bool, String> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err("missing condition after `#if`".into());
    }
    let mut parser = CondParser {
        tokens,
        pos: 0,
        defines,
    };
    let value = parser.parse_or()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(value),
        Some(tok) => Err(format!("unexpected {} in condition", describe(tok))),
    }
}

fn tokenize(expr: &str) -> Result<Vec<CondToken>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '!' => {
                chars.next();
                tokens.push(CondToken::Not);
            }
            '(' => {
                chars.next();
                tokens.push(CondToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(CondToken::RParen);
            }
            '&' | '|' => {
                chars.next();
                match chars.next() {
                    Some((_, next)) if next == c => tokens.push(if c == '&' {
                        CondToken::And
                    } else {
                        CondToken::Or
                    }),
                    _ => return Err(format!("expected `{c}{c}` in condition")),
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(CondToken::Ident(expr[start..end].to_string()));
            }
            other => return Err(format!("unexpected character `{other}` in condition")),
        }
    }

    Ok(tokens)
}

struct CondParser<'a> {
    tokens: Vec<CondToken>,
    pos: usize,
    defines: &'a HashSet<String>,
}

impl CondParser<'_> {
    fn parse_or(&mut self) -> Result<bool, String> {
        let mut value = self.parse_and()?;
        while self.eat(&CondToken::Or) {
            let rhs = self.parse_and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn parse_and(&mut self) -> Result<bool, String> {
        let mut value = self.parse_unary()?;
        while self.eat(&CondToken::And) {
            let rhs = self.parse_unary()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<bool, String> {
        let Some(tok) = self.tokens.get(self.pos).cloned() else {
            return Err("condition ends unexpectedly".into());
        };
        self.pos += 1;
        match tok {
            CondToken::Not => Ok(!self.parse_unary()?),
            CondToken::LParen => {
                let value = self.parse_or()?;
                if !self.eat(&CondToken::RParen) {
                    return Err("missing `)` in condition".into());
                }
                Ok(value)
            }
            CondToken::Ident(name) => Ok(self.defines.contains(&name)),
            other => Err(format!("unexpected {} in condition", describe(&other))),
        }
    }

    fn eat(&mut self, expected: &CondToken) -> bool {
        if self.tokens.get(self.pos) == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

fn describe(tok: &CondToken) -> String {
    match tok {
        CondToken::Ident(name) => format!("`{name}`"),
        CondToken::Not => "`!`".into(),
        CondToken::And => "`&&`".into(),
        CondToken::Or => "`||`".into(),
        CondToken::LParen => "`(`".into(),
        CondToken::RParen => "`)`".into(),
    }
}
