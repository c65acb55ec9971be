//! A small interpreter for the C subset the generator emits, so generated code can be run
//! from tests.
//!
//! It understands `#define` (object-like and function-like, with `##` pasting), `#ifdef`,
//! `#ifndef`, `#else` and `#endif`, declarations of `UINTn` variables and `const` tables,
//! and assignments built from `~ & | ^`, array indexing and the operation macros
//! (`ROLn`, `XORn`, `ANDnun`, ...), which are built in rather than expanded.
//!
//! Words are `word_size` bits wide and live in the smallest of `UINT8` to `UINT64` holding
//! them. As in C, `~` flips every bit of that container and stores truncate to it, so bits
//! above the word size show up if the generated code lets them through. In bitsliced mode,
//! which needs one-bit words, every `u64` instead carries 64 independent one-bit
//! computations, and table constants and literal operands are broadcast to all of them.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(u64),
    Punct(&'static str),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Number(value) => value.to_string(),
            Self::Punct(p) => (*p).to_string(),
        }
    }
}

const PUNCTS: [&str; 19] = [
    "##", "^=", "<<", ">>", "#", "^", "&", "|", "~", "(", ")", "[", "]", "{", "}", ",", ";",
    "=", "-",
];

fn tokenize(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token::Ident(text[start..i].to_string()));
        } else if c.is_ascii_digit() {
            let (radix, start) = if text[i..].starts_with("0x") || text[i..].starts_with("0X") {
                (16, i + 2)
            } else {
                (10, i)
            };
            i = start;
            while i < bytes.len() && (bytes[i] as char).is_digit(radix) {
                i += 1;
            }
            let value = u64::from_str_radix(&text[start..i], radix).unwrap();
            while i < bytes.len() && matches!(bytes[i], b'u' | b'U' | b'l' | b'L') {
                i += 1;
            }
            tokens.push(Token::Number(value));
        } else {
            let punct = PUNCTS
                .iter()
                .find(|p| text[i..].starts_with(*p))
                .unwrap_or_else(|| panic!("unexpected character {c:?} in {text:?}"));
            tokens.push(Token::Punct(*punct));
            i += punct.len();
        }
    }
    tokens
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("/*") {
            let end = after.find("*/").expect("unterminated comment");
            rest = &after[end + 2..];
        } else if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end..]);
        } else {
            let c = rest.chars().next().unwrap();
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if let Some(continued) = line.trim_end().strip_suffix('\\') {
            current.push_str(continued);
            current.push(' ');
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits `ROL64` into `("ROL", 64)` for the operation macros treated as built-ins.
fn builtin(name: &str) -> Option<(&str, usize)> {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let size = name[base.len()..].parse().ok()?;
    const BASES: [&str; 13] = [
        "ROL", "XOR", "XOReq", "NOT", "AND", "ANDnu", "ANDun", "ANDnn", "OR", "ORnu", "ORun",
        "ORnn", "CONST",
    ];
    BASES.contains(&base).then_some((base, size))
}

struct Macro {
    params: Option<Vec<String>>,
    body: Vec<Token>,
}

#[derive(Clone, Copy, Debug)]
enum BinaryOp {
    And,
    Or,
    Xor,
}

#[derive(Clone, Debug)]
enum Expr {
    Const(u64),
    Var(usize),
    Elem(usize, Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Rol(Box<Expr>, u32),
}

#[derive(Clone, Debug)]
enum Place {
    Var(usize),
    Elem(usize, Expr),
}

#[derive(Clone, Debug)]
struct Statement {
    target: Place,
    xor: bool,
    value: Expr,
}

/// Straight-line code ready to be run on many inputs.
pub struct Program {
    word_size: usize,
    mask: u64,
    container: u64,
    bitsliced: bool,
    symbols: BTreeSet<String>,
    macros: BTreeMap<String, Macro>,
    variables: BTreeMap<String, usize>,
    assigned: Vec<bool>,
    arrays: BTreeMap<String, usize>,
    tables: Vec<Vec<u64>>,
    statements: Vec<Statement>,
}

impl Program {
    /// Compiles `source` on words of `word_size` bits, with `symbols` defined for `#ifdef`.
    pub fn compile(source: &str, word_size: usize, symbols: &[&str]) -> Self {
        Self::build(source, word_size, false, symbols)
    }

    /// Compiles code on one-bit words so that each run evaluates 64 inputs at once.
    pub fn compile_bitsliced(source: &str, symbols: &[&str]) -> Self {
        Self::build(source, 1, true, symbols)
    }

    fn build(source: &str, word_size: usize, bitsliced: bool, symbols: &[&str]) -> Self {
        assert!(!bitsliced || word_size == 1);
        let mask = if bitsliced || word_size >= 64 {
            u64::MAX
        } else {
            (1 << word_size) - 1
        };
        let container = if !bitsliced && word_size < 8 { 0xFF } else { mask };
        let mut program = Self {
            word_size,
            mask,
            container,
            bitsliced,
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            macros: BTreeMap::new(),
            variables: BTreeMap::new(),
            assigned: Vec::new(),
            arrays: BTreeMap::new(),
            tables: Vec::new(),
            statements: Vec::new(),
        };
        // The marshalling arrays are supplied at run time.
        for name in ["state", "input"] {
            program.array_slot(name);
        }

        let mut active = vec![true];
        let mut code = String::new();
        for line in logical_lines(&strip_comments(source)) {
            let trimmed = line.trim();
            let Some(directive) = trimmed.strip_prefix('#') else {
                if active.iter().all(|&a| a) {
                    code.push_str(&line);
                    code.push('\n');
                }
                continue;
            };
            let directive = directive.trim_start();
            let (keyword, rest) = directive
                .split_once(char::is_whitespace)
                .unwrap_or((directive, ""));
            match keyword {
                "ifdef" => active.push(program.is_defined(rest.trim())),
                "ifndef" => active.push(!program.is_defined(rest.trim())),
                "else" => {
                    let last = active.last_mut().expect("#else without #if");
                    *last = !*last;
                }
                "endif" => {
                    active.pop().expect("#endif without #if");
                    assert!(!active.is_empty(), "unbalanced #endif");
                }
                "define" if active.iter().all(|&a| a) => program.define(rest.trim()),
                _ => {}
            }
        }
        assert_eq!(active.len(), 1, "unterminated #if");

        let tokens = program.expand(&tokenize(&code), 0);
        for statement in tokens.split(|t| *t == Token::Punct(";")) {
            if !statement.is_empty() {
                program.statement(statement);
            }
        }
        program
    }

    fn is_defined(&self, name: &str) -> bool {
        self.symbols.contains(name) || self.macros.contains_key(name)
    }

    fn define(&mut self, definition: &str) {
        let name_len = definition
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(definition.len());
        let name = &definition[..name_len];
        let after = &definition[name_len..];
        if builtin(name).is_some() {
            return;
        }
        let (params, body) = if let Some(after) = after.strip_prefix('(') {
            let close = after.find(')').expect("unterminated parameter list");
            let params = after[..close]
                .split(',')
                .map(|p| p.trim().to_string())
                .collect();
            (Some(params), &after[close + 1..])
        } else {
            (None, after)
        };
        self.macros.insert(
            name.to_string(),
            Macro {
                params,
                body: tokenize(body),
            },
        );
    }

    fn expand(&self, tokens: &[Token], depth: usize) -> Vec<Token> {
        assert!(depth < 16, "macro expansion too deep");
        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if let Token::Ident(name) = &tokens[i] {
                if let Some(m) = self.macros.get(name) {
                    match &m.params {
                        None => {
                            out.extend(self.expand(&m.body, depth + 1));
                            i += 1;
                            continue;
                        }
                        Some(params) if tokens.get(i + 1) == Some(&Token::Punct("(")) => {
                            let (args, next) = collect_args(tokens, i + 2);
                            assert_eq!(args.len(), params.len(), "arity of {name}");
                            let body = substitute(&m.body, params, &args);
                            out.extend(self.expand(&body, depth + 1));
                            i = next;
                            continue;
                        }
                        Some(_) => {}
                    }
                }
            }
            out.push(tokens[i].clone());
            i += 1;
        }
        out
    }

    fn array_slot(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.arrays.get(name) {
            return slot;
        }
        self.tables.push(Vec::new());
        self.arrays.insert(name.to_string(), self.tables.len() - 1);
        self.tables.len() - 1
    }

    fn statement(&mut self, tokens: &[Token]) {
        let mut parser = Parser { tokens, pos: 0 };
        if parser.peek_ident() == Some("const") {
            parser.pos += 1;
        }
        if parser.peek_ident().is_some_and(|t| t.starts_with("UINT")) {
            parser.pos += 1;
            self.declaration(&mut parser);
            return;
        }
        if let Some(("XOReq", _)) = parser.peek_ident().and_then(builtin) {
            parser.pos += 1;
            parser.expect("(");
            let target = self.place(&mut parser);
            parser.expect(",");
            let value = self.expr(&mut parser);
            parser.expect(")");
            parser.finish();
            self.push(target, true, value);
            return;
        }

        let target = self.place(&mut parser);
        let xor = match parser.next() {
            Token::Punct("=") => false,
            Token::Punct("^=") => true,
            other => panic!("expected an assignment, found {other:?}"),
        };
        let value = self.expr(&mut parser);
        parser.finish();
        self.push(target, xor, value);
    }

    fn push(&mut self, target: Place, xor: bool, value: Expr) {
        if let Place::Var(slot) = target {
            assert!(!xor || self.assigned[slot], "variable updated before being assigned");
            self.assigned[slot] = true;
        }
        self.statements.push(Statement { target, xor, value });
    }

    fn declaration(&mut self, parser: &mut Parser<'_>) {
        let name = parser.ident();
        if parser.eat("[") {
            let len = parser.number() as usize;
            parser.expect("]");
            parser.expect("=");
            parser.expect("{");
            let mut values = Vec::with_capacity(len);
            while !parser.eat("}") {
                let value = parser.number();
                values.push(if self.bitsliced {
                    if value & 1 == 1 { u64::MAX } else { 0 }
                } else {
                    value & self.mask
                });
                parser.eat(",");
            }
            assert_eq!(values.len(), len, "size of table {name}");
            let slot = self.array_slot(&name);
            self.tables[slot] = values;
            parser.finish();
            return;
        }
        let mut name = name;
        loop {
            assert!(
                !self.variables.contains_key(&name),
                "{name} declared twice"
            );
            self.variables.insert(name, self.assigned.len());
            self.assigned.push(false);
            if !parser.eat(",") {
                break;
            }
            name = parser.ident();
        }
        parser.finish();
    }

    fn place(&mut self, parser: &mut Parser<'_>) -> Place {
        let name = parser.ident();
        if parser.eat("[") {
            let slot = *self.arrays.get(&name).unwrap_or_else(|| panic!("unknown array {name}"));
            let index = self.expr(parser);
            parser.expect("]");
            Place::Elem(slot, index)
        } else {
            let slot = *self
                .variables
                .get(&name)
                .unwrap_or_else(|| panic!("{name} assigned but not declared"));
            Place::Var(slot)
        }
    }

    fn expr(&mut self, parser: &mut Parser<'_>) -> Expr {
        let mut lhs = self.xor_expr(parser);
        while parser.eat("|") {
            let rhs = self.xor_expr(parser);
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn xor_expr(&mut self, parser: &mut Parser<'_>) -> Expr {
        let mut lhs = self.and_expr(parser);
        while parser.eat("^") {
            let rhs = self.and_expr(parser);
            lhs = Expr::Binary(BinaryOp::Xor, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn and_expr(&mut self, parser: &mut Parser<'_>) -> Expr {
        let mut lhs = self.unary(parser);
        while parser.eat("&") {
            let rhs = self.unary(parser);
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn unary(&mut self, parser: &mut Parser<'_>) -> Expr {
        if parser.eat("~") {
            return Expr::Not(Box::new(self.unary(parser)));
        }
        match parser.next() {
            Token::Number(value) => Expr::Const(value),
            Token::Punct("(") => {
                let inner = self.expr(parser);
                parser.expect(")");
                inner
            }
            Token::Ident(name) => {
                if let Some((base, size)) = builtin(&name) {
                    assert_eq!(size, self.word_size, "{name} on {}-bit words", self.word_size);
                    return self.call(base, parser);
                }
                if parser.eat("[") {
                    let slot = *self
                        .arrays
                        .get(&name)
                        .unwrap_or_else(|| panic!("unknown array {name}"));
                    let index = self.expr(parser);
                    parser.expect("]");
                    return Expr::Elem(slot, Box::new(index));
                }
                let slot = *self
                    .variables
                    .get(&name)
                    .unwrap_or_else(|| panic!("{name} used but not declared"));
                assert!(self.assigned[slot], "{name} read before being assigned");
                Expr::Var(slot)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    fn call(&mut self, base: &str, parser: &mut Parser<'_>) -> Expr {
        parser.expect("(");
        let a = self.expr(parser);
        let expr = match base {
            "NOT" => Expr::Not(Box::new(a)),
            "CONST" => a,
            "ROL" => {
                parser.expect(",");
                let amount = parser.number() as u32;
                assert!(amount > 0 && (amount as usize) < self.word_size);
                Expr::Rol(Box::new(a), amount)
            }
            _ => {
                parser.expect(",");
                let b = self.expr(parser);
                let negate = |e: Expr, n: bool| if n { Expr::Not(Box::new(e)) } else { e };
                let (op, suffix) = if let Some(suffix) = base.strip_prefix("AND") {
                    (BinaryOp::And, suffix)
                } else if let Some(suffix) = base.strip_prefix("OR") {
                    (BinaryOp::Or, suffix)
                } else {
                    assert_eq!(base, "XOR");
                    (BinaryOp::Xor, "")
                };
                let (na, nb) = match suffix {
                    "" => (false, false),
                    "nu" => (true, false),
                    "un" => (false, true),
                    "nn" => (true, true),
                    _ => panic!("unknown operation {base}"),
                };
                Expr::Binary(op, Box::new(negate(a, na)), Box::new(negate(b, nb)))
            }
        };
        parser.expect(")");
        expr
    }

    /// Number of statements, after macro expansion.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Runs the program with the given arrays, typically `state` and `input`.
    pub fn run(&self, arrays: &[(&str, &[u64])]) -> Machine<'_> {
        let mut machine = Machine {
            program: self,
            vars: vec![0; self.assigned.len()],
            arrays: self.tables.clone(),
        };
        for (name, values) in arrays {
            let slot = self.arrays[*name];
            machine.arrays[slot] = values.iter().map(|v| v & self.mask).collect();
        }
        for statement in &self.statements {
            let value = machine.eval(&statement.value);
            let target = match &statement.target {
                Place::Var(slot) => &mut machine.vars[*slot],
                Place::Elem(slot, index) => {
                    let index = machine.eval(index) as usize;
                    &mut machine.arrays[*slot][index]
                }
            };
            *target = (if statement.xor { *target ^ value } else { value }) & self.container;
        }
        machine
    }
}

pub struct Machine<'p> {
    program: &'p Program,
    vars: Vec<u64>,
    arrays: Vec<Vec<u64>>,
}

impl Machine<'_> {
    pub fn array(&self, name: &str) -> &[u64] {
        &self.arrays[self.program.arrays[name]]
    }

    pub fn var(&self, name: &str) -> u64 {
        self.vars[self.program.variables[name]]
    }

    fn eval(&self, expr: &Expr) -> u64 {
        let mask = self.program.mask;
        match expr {
            Expr::Const(value) => *value,
            Expr::Var(slot) => self.vars[*slot],
            Expr::Elem(slot, index) => self.arrays[*slot][self.eval(index) as usize],
            Expr::Not(a) => !self.eval(a) & self.program.container,
            Expr::Binary(op, a, b) => {
                let (a, b) = (self.operand(a), self.operand(b));
                match op {
                    BinaryOp::And => a & b,
                    BinaryOp::Or => a | b,
                    BinaryOp::Xor => a ^ b,
                }
            }
            // The ROLn macros mask their result to the word size.
            Expr::Rol(a, amount) => {
                let ws = self.program.word_size as u32;
                let a = self.eval(a);
                ((a << amount) ^ ((a & mask) >> (ws - amount))) & mask
            }
        }
    }

    /// An operand of `& | ^`; bitsliced literals such as the mask `0x1` are broadcast.
    fn operand(&self, expr: &Expr) -> u64 {
        match expr {
            Expr::Const(value) if self.program.bitsliced => {
                if value & 1 == 1 { u64::MAX } else { 0 }
            }
            _ => self.eval(expr),
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn next(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| panic!("unexpected end of statement {:?}", self.tokens));
        self.pos += 1;
        token
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.tokens.get(self.pos) {
            Some(Token::Ident(name)) => Some(name),
            _ => None,
        }
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.tokens.get(self.pos), Some(Token::Punct(p)) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) {
        assert!(self.eat(punct), "expected {punct:?} in {:?}", self.tokens);
    }

    fn ident(&mut self) -> String {
        match self.next() {
            Token::Ident(name) => name,
            other => panic!("expected an identifier, found {other:?}"),
        }
    }

    fn number(&mut self) -> u64 {
        match self.next() {
            Token::Number(value) => value,
            other => panic!("expected a number, found {other:?}"),
        }
    }

    fn finish(&self) {
        assert_eq!(self.pos, self.tokens.len(), "trailing tokens in {:?}", self.tokens);
    }
}

fn collect_args(tokens: &[Token], mut i: usize) -> (Vec<Vec<Token>>, usize) {
    let mut args = vec![Vec::new()];
    let mut depth = 0;
    loop {
        let token = tokens.get(i).expect("unterminated macro call");
        i += 1;
        match token {
            Token::Punct("(") => depth += 1,
            Token::Punct(")") if depth == 0 => return (args, i),
            Token::Punct(")") => depth -= 1,
            Token::Punct(",") if depth == 0 => {
                args.push(Vec::new());
                continue;
            }
            _ => {}
        }
        args.last_mut().unwrap().push(token.clone());
    }
}

fn substitute(body: &[Token], params: &[String], args: &[Vec<Token>]) -> Vec<Token> {
    let mut substituted = Vec::new();
    for token in body {
        match token {
            Token::Ident(name) if params.contains(name) => {
                let index = params.iter().position(|p| p == name).unwrap();
                substituted.extend(args[index].iter().cloned());
            }
            _ => substituted.push(token.clone()),
        }
    }

    let mut pasted: Vec<Token> = Vec::new();
    let mut iter = substituted.into_iter();
    while let Some(token) = iter.next() {
        if token == Token::Punct("##") {
            let left = pasted.pop().expect("## at start of macro body");
            let right = iter.next().expect("## at end of macro body");
            let mut joined = tokenize(&(left.text() + &right.text()));
            assert_eq!(joined.len(), 1, "pasting did not form one token");
            pasted.push(joined.remove(0));
        } else {
            pasted.push(token);
        }
    }
    pasted
}

/// Spreads 64 Keccak-f\[25\] states over 25 bitsliced lanes.
pub fn bitslice(states: &[u32]) -> Vec<u64> {
    assert!(states.len() <= 64);
    (0..25)
        .map(|lane| {
            states
                .iter()
                .enumerate()
                .fold(0, |word, (j, s)| word | (u64::from((s >> lane) & 1) << j))
        })
        .collect()
}

/// Inverse of [`bitslice`] for `count` states.
pub fn unbitslice(lanes: &[u64], count: usize) -> Vec<u32> {
    (0..count)
        .map(|j| {
            lanes
                .iter()
                .enumerate()
                .fold(0, |state, (lane, word)| state | ((((word >> j) & 1) as u32) << lane))
        })
        .collect()
}

/// The statements calling the macros of a macro file to run `nr_rounds` rounds on `state`.
pub fn macro_driver(nr_rounds: usize) -> String {
    let mut driver = String::from("declareABCDE\ncopyFromState(A, state)\nprepareTheta\n");
    for round in 0..nr_rounds {
        let (from, to) = if round % 2 == 0 { ("A", "E") } else { ("E", "A") };
        driver.push_str(&format!(
            "thetaRhoPiChiIotaPrepareTheta({round}, {from}, {to})\n"
        ));
    }
    let last = if nr_rounds % 2 == 0 { "A" } else { "E" };
    driver.push_str(&format!("copyToState(state, {last})\n"));
    driver
}
