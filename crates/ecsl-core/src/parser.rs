use crate::ast::*;
use crate::blocks::{split_block, BlockStore};
use crate::config::ParserOptions;
use crate::literal::{self, DecodeError};
use crate::tokenizer::{Token, TokenKind};
use std::mem;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed tag at token {index}: {message}")]
    MalformedTag { index: usize, message: String },
    #[error("closing tag at token {index} has no open element")]
    UnmatchedClosingTag { index: usize },
    #[error("closing tag </{found}> at token {index} does not match <{expected}>")]
    MismatchedClosingTag {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("element <{name}> opened at token {index} is never closed")]
    UnclosedElement { name: String, index: usize },
    #[error("cannot decode value of attribute `{attribute}` at token {index}: {source}")]
    AttributeDecode {
        attribute: String,
        index: usize,
        #[source]
        source: DecodeError,
    },
    #[error("unknown macro block `{label}` at token {index}")]
    UnknownBlock { label: String, index: usize },
    #[error("unknown macro `{name}` at token {index}")]
    UnknownMacro { name: String, index: usize },
    #[error("malformed macro call at token {index}: {message}")]
    MalformedMacro { index: usize, message: String },
    #[error("element nesting exceeds {limit} levels at token {index}")]
    NestingTooDeep { limit: usize, index: usize },
    #[error("document exceeds {limit} nodes at token {index}")]
    TooManyNodes { limit: usize, index: usize },
}

impl ParseError {
    /// Index of the offending token in the sequence given to the parser.
    pub fn token_index(&self) -> usize {
        match self {
            ParseError::MalformedTag { index, .. }
            | ParseError::UnmatchedClosingTag { index }
            | ParseError::MismatchedClosingTag { index, .. }
            | ParseError::UnclosedElement { index, .. }
            | ParseError::AttributeDecode { index, .. }
            | ParseError::UnknownBlock { index, .. }
            | ParseError::UnknownMacro { index, .. }
            | ParseError::MalformedMacro { index, .. }
            | ParseError::NestingTooDeep { index, .. }
            | ParseError::TooManyNodes { index, .. } => *index,
        }
    }

    fn malformed(index: usize, message: impl Into<String>) -> Self {
        ParseError::MalformedTag {
            index,
            message: message.into(),
        }
    }
}

/// Parse a token sequence with default options.
pub fn parse(tokens: &[Token]) -> Result<Document, ParseError> {
    parse_with(tokens, &ParserOptions::default())
}

/// Parse a token sequence. Each call gets its own block store.
pub fn parse_with(tokens: &[Token], options: &ParserOptions) -> Result<Document, ParseError> {
    Parser::new(tokens, options).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Just saw `<`.
    ExpectNodeName,
    InAttributes,
    InMacroArgs,
}

/// Parse state of one element body, or of the document itself.
#[derive(Debug)]
struct Frame {
    state: State,
    current: Option<Node>,
    /// Token index of the current node's name.
    current_index: usize,
    label: SectionLabel,
    accumulated: Vec<Node>,
    macro_args: Vec<String>,
    block_offset: usize,
    sections: Sections,
}

impl Frame {
    fn new(block_offset: usize) -> Self {
        Self {
            state: State::Idle,
            current: None,
            current_index: 0,
            label: SectionLabel::Default,
            accumulated: Vec::new(),
            macro_args: Vec::new(),
            block_offset,
            sections: Sections::new(),
        }
    }

    /// Move the accumulated nodes into `sections`. Empty sections are dropped.
    fn flush(&mut self) {
        if !self.accumulated.is_empty() {
            let nodes = mem::take(&mut self.accumulated);
            self.sections.insert(self.label.clone(), nodes);
        }
    }
}

/// An element whose body is being parsed by a nested frame.
#[derive(Debug)]
struct OpenElement {
    node: Node,
    index: usize,
}

struct Parser<'a> {
    tokens: &'a [Token],
    options: &'a ParserOptions,
    blocks: BlockStore,
    frame: Frame,
    /// Suspended enclosing frames, each with the element its child frame fills.
    parents: Vec<(Frame, OpenElement)>,
    /// Nodes built so far, counting every copy a splice makes.
    node_count: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], options: &'a ParserOptions) -> Self {
        Self {
            tokens,
            options,
            blocks: BlockStore::new(),
            frame: Frame::new(0),
            parents: Vec::new(),
            node_count: 0,
        }
    }

    fn run(mut self) -> Result<Document, ParseError> {
        let mut pos = 0;
        while pos < self.tokens.len() {
            pos = self.step(pos)?;
        }

        if let Some((_, open)) = self.parents.pop() {
            return Err(ParseError::UnclosedElement {
                name: open.node.name,
                index: open.index,
            });
        }

        self.frame.flush();
        debug!(
            tokens = self.tokens.len(),
            blocks = self.blocks.len(),
            nodes = self.node_count,
            sections = self.frame.sections.len(),
            "parsed document"
        );
        Ok(Document {
            sections: self.frame.sections,
        })
    }

    /// Handle the token at `pos` and return the index to resume at.
    fn step(&mut self, pos: usize) -> Result<usize, ParseError> {
        match self.tokens[pos].kind {
            TokenKind::TagOpen => {
                self.frame.state = State::ExpectNodeName;
                Ok(pos + 1)
            }
            TokenKind::Name => self.on_name(pos),
            TokenKind::TagClose => self.on_tag_close(pos),
            TokenKind::Slash => self.on_slash(pos),
            TokenKind::MacroOpen => {
                self.frame.state = State::InMacroArgs;
                self.frame.macro_args.clear();
                Ok(pos + 1)
            }
            TokenKind::MacroClose => self.on_macro_close(pos),
            // Only meaningful inside an attribute list, where on_name consumes them.
            TokenKind::Equals | TokenKind::StringLiteral => Ok(pos + 1),
            TokenKind::RawScalar => Err(ParseError::malformed(
                pos,
                "`v\"...\"` is only allowed as an attribute value",
            )),
        }
    }

    /// Account for `added` new nodes against `max_nodes`.
    fn count_nodes(&mut self, added: usize, pos: usize) -> Result<(), ParseError> {
        self.node_count = self.node_count.saturating_add(added);
        if self.node_count > self.options.max_nodes {
            return Err(ParseError::TooManyNodes {
                limit: self.options.max_nodes,
                index: pos,
            });
        }
        Ok(())
    }

    fn on_name(&mut self, pos: usize) -> Result<usize, ParseError> {
        let tokens = self.tokens;
        let text = &tokens[pos].text;
        match self.frame.state {
            State::ExpectNodeName => {
                self.count_nodes(1, pos)?;
                self.frame.current = Some(Node::new(text.clone()));
                self.frame.current_index = pos;
                self.frame.state = State::InAttributes;
                Ok(pos + 1)
            }
            State::InAttributes => self.on_attribute(pos),
            State::InMacroArgs => {
                self.frame.macro_args.push(text.clone());
                Ok(pos + 1)
            }
            State::Idle => {
                self.frame.flush();
                self.frame.label = SectionLabel::Named(text.clone());
                Ok(pos + 1)
            }
        }
    }

    fn on_attribute(&mut self, pos: usize) -> Result<usize, ParseError> {
        let tokens = self.tokens;
        let name = tokens[pos].text.clone();

        let has_value = tokens
            .get(pos + 1)
            .is_some_and(|t| t.is(TokenKind::Equals));
        let (value, next) = if has_value {
            let value_token = tokens.get(pos + 2).ok_or_else(|| {
                ParseError::malformed(pos + 1, format!("missing value for attribute `{name}`"))
            })?;
            let value = match value_token.kind {
                TokenKind::StringLiteral => {
                    let decoded = literal::decode(&value_token.text).map_err(|source| {
                        ParseError::AttributeDecode {
                            attribute: name.clone(),
                            index: pos + 2,
                            source,
                        }
                    })?;
                    AttrValue::String(decoded)
                }
                TokenKind::Name | TokenKind::RawScalar => AttrValue::Raw(value_token.text.clone()),
                _ => {
                    return Err(ParseError::malformed(
                        pos + 2,
                        format!("expected a value for attribute `{name}`"),
                    ))
                }
            };
            (value, pos + 3)
        } else {
            (AttrValue::Absent, pos + 1)
        };

        let node = self
            .frame
            .current
            .as_mut()
            .ok_or_else(|| ParseError::malformed(pos, "attribute outside of a tag"))?;
        node.set_attribute(name, value);
        Ok(next)
    }

    fn on_tag_close(&mut self, pos: usize) -> Result<usize, ParseError> {
        let tokens = self.tokens;
        let is_slash = |i: Option<usize>| i.is_some_and(|i| tokens[i].is(TokenKind::Slash));
        let self_closing = is_slash(pos.checked_sub(1));
        let opening = !self_closing && !is_slash(pos.checked_sub(2));
        self.frame.state = State::Idle;

        if !self_closing && !opening {
            return Err(ParseError::malformed(pos, "`>` ends a closing tag that was never opened"));
        }

        let node = self
            .frame
            .current
            .take()
            .ok_or_else(|| ParseError::malformed(pos, "`>` without an element"))?;

        if self_closing {
            self.frame.accumulated.push(node);
            return Ok(pos + 1);
        }
        self.open_element(node, pos)
    }

    /// Suspend the current frame and start a fresh one for `node`'s body.
    fn open_element(&mut self, node: Node, pos: usize) -> Result<usize, ParseError> {
        let depth = self.parents.len() + 1;
        if depth > self.options.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.options.max_depth,
                index: pos,
            });
        }
        trace!(depth, element = %node.name, "enter body");

        let child = Frame::new(self.frame.block_offset);
        let parent = mem::replace(&mut self.frame, child);
        let open = OpenElement {
            node,
            index: parent.current_index,
        };
        self.parents.push((parent, open));
        Ok(pos + 1)
    }

    fn on_slash(&mut self, pos: usize) -> Result<usize, ParseError> {
        // `/` of a self-closing tag; the following `>` finishes the node.
        if self.frame.current.is_some() {
            return Ok(pos + 1);
        }

        let Some((parent, mut open)) = self.parents.pop() else {
            return Err(ParseError::UnmatchedClosingTag { index: pos });
        };

        let tokens = self.tokens;
        let name = tokens.get(pos + 1).filter(|t| t.is(TokenKind::Name));
        let close = tokens.get(pos + 2).filter(|t| t.is(TokenKind::TagClose));
        let (Some(name), Some(_)) = (name, close) else {
            return Err(ParseError::malformed(pos, "expected `name>` after `</`"));
        };
        if self.options.strict_closing_tags && name.text != open.node.name {
            return Err(ParseError::MismatchedClosingTag {
                index: pos + 1,
                expected: open.node.name,
                found: name.text.clone(),
            });
        }

        let mut body = mem::replace(&mut self.frame, parent);
        body.flush();
        open.node.sections = body.sections;
        trace!(depth = self.parents.len() + 1, element = %open.node.name, "leave body");
        self.frame.accumulated.push(open.node);

        // Resume one past the closing tag's `>`.
        Ok(pos + 3)
    }

    fn on_macro_close(&mut self, pos: usize) -> Result<usize, ParseError> {
        self.frame.state = State::Idle;
        let mut args = mem::take(&mut self.frame.macro_args).into_iter();

        let name = args.next().ok_or_else(|| ParseError::MalformedMacro {
            index: pos,
            message: "empty macro call".to_string(),
        })?;
        if !matches!(name.as_str(), "block_start" | "block_finish" | "block") {
            return Err(ParseError::UnknownMacro { name, index: pos });
        }
        let label = args.next().ok_or_else(|| ParseError::MalformedMacro {
            index: pos,
            message: format!("`{name}` needs a block label"),
        })?;

        let frame = &mut self.frame;
        match name.as_str() {
            "block_start" => {
                frame.block_offset = frame.accumulated.len();
                debug!(%label, offset = frame.block_offset, "block start");
            }
            "block_finish" => {
                let (captured, kept) = split_block(&frame.accumulated, frame.block_offset);
                debug!(%label, offset = frame.block_offset, captured = captured.len(), "block finish");
                self.blocks.capture(label, captured);
                frame.accumulated = kept;
                frame.block_offset = 0;
            }
            _ => {
                let block = self
                    .blocks
                    .get(&label)
                    .ok_or_else(|| ParseError::UnknownBlock {
                        label: label.clone(),
                        index: pos,
                    })?;
                self.node_count = self.node_count.saturating_add(block.node_count);
                if self.node_count > self.options.max_nodes {
                    return Err(ParseError::TooManyNodes {
                        limit: self.options.max_nodes,
                        index: pos,
                    });
                }
                debug!(%label, nodes = block.nodes.len(), total = self.node_count, "block splice");
                frame.accumulated.extend_from_slice(&block.nodes);
            }
        }
        Ok(pos + 1)
    }
}
