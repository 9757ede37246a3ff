//! Single-pass assembler with deferred forward-reference patching.
//!
//! Code grows upward from address 0 (`used`); variables and `allocate`
//! blocks grow downward from the last memory cell (`data`). The two cursors
//! must never meet. Operands naming a symbol that is not yet defined emit 0
//! and are patched from the label table once the whole source is read.

use log::{debug, trace};

use bitserial_core::{encode, DisassemblyRow, MemoryImage, MemorySize, OPERAND_MASK};

use crate::errors::{AssembleError, AssembleErrorKind, SourceLocation};
use crate::macros::{capture_body, MacroTable};
use crate::mnemonic::{pseudo_op, resolve, Directive};
use crate::parser::{parse_number, tokenize};
use crate::symbols::{SymbolKind, SymbolTable};

/// Default limit on nested macro expansion.
pub const DEFAULT_MAX_MACRO_DEPTH: usize = 16;

/// Assembler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Memory capacity the image is laid out for.
    pub memory_size: MemorySize,
    /// Deepest allowed macro expansion.
    pub max_macro_depth: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            memory_size: MemorySize::default(),
            max_macro_depth: DEFAULT_MAX_MACRO_DEPTH,
        }
    }
}

/// Output of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Full memory image. Its saved prefix covers the code and every cell
    /// written by `.set`.
    pub image: MemoryImage,
    /// Symbols in definition order.
    pub symbols: SymbolTable,
    /// Number of code words emitted from address 0.
    pub code_words: usize,
}

impl Assembly {
    /// Disassembly of the emitted code.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn listing(&self) -> Vec<DisassemblyRow> {
        self.image.words()[..self.code_words]
            .iter()
            .enumerate()
            .map(|(addr, &word)| DisassemblyRow::new(addr as u16, word))
            .collect()
    }
}

/// Assembles `source` for the default 4096-word memory.
///
/// # Errors
///
/// Returns the first [`AssembleError`] encountered; no partial image is
/// produced.
pub fn assemble(source: &str) -> Result<Assembly, AssembleError> {
    assemble_with(source, &AssemblerConfig::default())
}

/// Assembles `source` with an explicit configuration.
///
/// # Errors
///
/// Returns the first [`AssembleError`] encountered; no partial image is
/// produced.
pub fn assemble_with(source: &str, config: &AssemblerConfig) -> Result<Assembly, AssembleError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut assembler = Assembler::new(config);
    assembler.assemble_lines(&lines, None, 0)?;
    assembler.finish()
}

#[derive(Debug)]
struct Unresolved {
    name: String,
    addr: usize,
    location: SourceLocation,
}

struct Assembler<'cfg> {
    config: &'cfg AssemblerConfig,
    memory: Vec<u16>,
    used: usize,
    data: usize,
    extent: usize,
    symbols: SymbolTable,
    unresolved: Vec<Unresolved>,
    macros: MacroTable,
}

impl<'cfg> Assembler<'cfg> {
    fn new(config: &'cfg AssemblerConfig) -> Self {
        let words = config.memory_size.words();
        Self {
            config,
            memory: vec![0; words],
            used: 0,
            data: words - 1,
            extent: 0,
            symbols: SymbolTable::new(),
            unresolved: Vec::new(),
            macros: MacroTable::new(),
        }
    }

    fn assemble_lines<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        scope: Option<&str>,
        depth: usize,
    ) -> Result<(), AssembleError> {
        let mut index = 0;
        while index < lines.len() {
            let location = scope.map_or_else(
                || SourceLocation::line(index + 1),
                |name| SourceLocation::in_macro(index + 1, name),
            );
            let at = |kind| AssembleError::new(kind).with_location(location.clone());

            if self.used >= self.data {
                return Err(at(AssembleErrorKind::SpaceExhausted));
            }

            let fields = tokenize(lines[index].as_ref());
            match fields.as_slice() {
                [] => {}
                [keyword, name] if Directive::parse(keyword) == Some(Directive::Macro) => {
                    if scope.is_some() {
                        return Err(at(AssembleErrorKind::NestedMacro((*name).to_owned())));
                    }
                    let (body, end) = capture_body(lines, index + 1).ok_or_else(|| {
                        at(AssembleErrorKind::UnterminatedMacro((*name).to_owned()))
                    })?;
                    debug!("captured macro {name}: {} lines", body.len());
                    self.macros.define(name, body).map_err(at)?;
                    index = end;
                }
                [field] => self.assemble_single(field, &location, depth)?,
                [first, operand] => self.assemble_pair(first, operand, &location).map_err(at)?,
                [first, target, value] => self.assemble_triple(first, target, value).map_err(at)?,
                _ => return Err(at(AssembleErrorKind::TooManyFields(fields.len()))),
            }
            index += 1;
        }
        Ok(())
    }

    fn assemble_single(
        &mut self,
        field: &str,
        location: &SourceLocation,
        depth: usize,
    ) -> Result<(), AssembleError> {
        let at = |kind| AssembleError::new(kind).with_location(location.clone());

        if let Some(word) = parse_number(field).map_err(at)? {
            self.emit(word);
        } else if let Some(word) = pseudo_op(field) {
            self.emit(word);
        } else if let Some(symbol) = self.symbols.get(field) {
            let word = symbol.value;
            self.emit(word);
        } else if let Some(body) = self.macros.get(field).map(|m| m.body.clone()) {
            if depth >= self.config.max_macro_depth {
                return Err(at(AssembleErrorKind::MacroDepthExceeded {
                    name: field.to_owned(),
                    limit: self.config.max_macro_depth,
                }));
            }
            debug!("expanding macro {field} at depth {}", depth + 1);
            self.assemble_lines(&body, Some(field), depth + 1)?;
        } else if Directive::parse(field) == Some(Directive::End) {
            return Err(at(AssembleErrorKind::StrayEnd));
        } else if resolve(field).is_some() || Directive::parse(field).is_some() {
            return Err(at(AssembleErrorKind::MissingOperand(field.to_owned())));
        } else {
            return Err(at(AssembleErrorKind::UnknownCommand(field.to_owned())));
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn assemble_pair(
        &mut self,
        first: &str,
        operand: &str,
        location: &SourceLocation,
    ) -> Result<(), AssembleErrorKind> {
        match Directive::parse(first) {
            Some(Directive::Variable) => {
                self.symbols
                    .define(operand, SymbolKind::Variable, self.data as u16)?;
                self.data -= 1;
            }
            Some(Directive::Label) => {
                self.symbols
                    .define(operand, SymbolKind::Label, self.used as u16)?;
            }
            Some(Directive::Allocate) => {
                let count = usize::from(self.allocate_count(operand)?);
                self.data = self
                    .data
                    .checked_sub(count)
                    .ok_or(AssembleErrorKind::SpaceExhausted)?;
            }
            Some(Directive::End) => return Err(AssembleErrorKind::StrayEnd),
            Some(Directive::Set | Directive::Constant | Directive::Macro) => {
                return Err(AssembleErrorKind::MissingOperand(first.to_owned()));
            }
            None => {
                let opcode =
                    resolve(first).ok_or_else(|| AssembleErrorKind::UnknownCommand(first.to_owned()))?;
                let operand = match parse_number(operand)? {
                    Some(value) if value > OPERAND_MASK => {
                        return Err(AssembleErrorKind::OperandTooLarge(value));
                    }
                    Some(value) => value,
                    None => self.symbol_operand(operand, location)?,
                };
                self.emit(encode(opcode, operand));
            }
        }
        Ok(())
    }

    fn assemble_triple(
        &mut self,
        first: &str,
        target: &str,
        value: &str,
    ) -> Result<(), AssembleErrorKind> {
        match Directive::parse(first) {
            Some(Directive::Set) => {
                let addr = self.value_of(target)?;
                let slot = usize::from(addr);
                if slot >= self.memory.len() {
                    return Err(AssembleErrorKind::AddressOutOfRange(addr));
                }
                let word = self.value_of(value)?;
                trace!("set {addr:04x} = {word:04x}");
                self.memory[slot] = word;
                self.extent = self.extent.max(slot + 1);
            }
            Some(Directive::Constant) => {
                let word = self.value_of(value)?;
                self.symbols.define(target, SymbolKind::Constant, word)?;
            }
            _ => return Err(AssembleErrorKind::UnknownCommand(first.to_owned())),
        }
        Ok(())
    }

    /// Operand for a symbolic reference; unknown names are queued for patching.
    fn symbol_operand(
        &mut self,
        name: &str,
        location: &SourceLocation,
    ) -> Result<u16, AssembleErrorKind> {
        if let Some(symbol) = self.symbols.get(name) {
            return checked_operand(symbol.value);
        }
        self.unresolved.push(Unresolved {
            name: name.to_owned(),
            addr: self.used,
            location: location.clone(),
        });
        Ok(0)
    }

    fn value_of(&self, token: &str) -> Result<u16, AssembleErrorKind> {
        if let Some(value) = parse_number(token)? {
            return Ok(value);
        }
        self.symbols
            .get(token)
            .map(|symbol| symbol.value)
            .ok_or_else(|| AssembleErrorKind::UndefinedSymbol(token.to_owned()))
    }

    fn allocate_count(&self, token: &str) -> Result<u16, AssembleErrorKind> {
        if let Some(value) = parse_number(token)? {
            return Ok(value);
        }
        match self.symbols.get(token) {
            Some(symbol) if symbol.kind == SymbolKind::Constant => Ok(symbol.value),
            Some(_) => Err(AssembleErrorKind::NotAConstant(token.to_owned())),
            None => Err(AssembleErrorKind::UndefinedSymbol(token.to_owned())),
        }
    }

    fn emit(&mut self, word: u16) {
        trace!("{:04x}: {word:04x}", self.used);
        self.memory[self.used] = word;
        self.used += 1;
        self.extent = self.extent.max(self.used);
    }

    fn finish(mut self) -> Result<Assembly, AssembleError> {
        for entry in std::mem::take(&mut self.unresolved) {
            match self.symbols.get(&entry.name) {
                Some(symbol) if symbol.kind == SymbolKind::Label => {
                    let operand = checked_operand(symbol.value)
                        .map_err(|kind| AssembleError::new(kind).with_location(entry.location))?;
                    let word = &mut self.memory[entry.addr];
                    *word = (*word & !OPERAND_MASK) | operand;
                    debug!("patched {:04x} -> {} ({:04x})", entry.addr, entry.name, symbol.value);
                }
                _ => {
                    return Err(AssembleError::new(AssembleErrorKind::UnresolvedReference(
                        entry.name,
                    ))
                    .with_location(entry.location));
                }
            }
        }

        if self.used >= self.data {
            return Err(AssembleError::new(AssembleErrorKind::SpaceExhausted));
        }

        Ok(Assembly {
            image: MemoryImage::with_used(self.memory, self.extent),
            symbols: self.symbols,
            code_words: self.used,
        })
    }
}

/// Symbol values used as instruction operands must fit the 12-bit field.
const fn checked_operand(value: u16) -> Result<u16, AssembleErrorKind> {
    if value > OPERAND_MASK {
        Err(AssembleErrorKind::OperandTooLarge(value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(source: &str) -> Vec<u16> {
        let assembly = assemble(source).expect("source assembles");
        assembly.image.saved_words().to_vec()
    }

    fn error_kind(source: &str) -> AssembleErrorKind {
        assemble(source).expect_err("source must fail").kind
    }

    #[test]
    fn instructions_and_raw_words() {
        assert_eq!(
            words("literal $0005\nstore $0f00\n$BEEF\nnop\nclr"),
            vec![0xA005, 0x7F00, 0xBEEF, 0x0000, 0xA000]
        );
    }

    #[test]
    fn comments_and_blank_lines_emit_nothing() {
        assert_eq!(words("; header\n\n  # note\nxor $1 ; trailing"), vec![0x2001]);
    }

    #[test]
    fn variables_grow_down_from_top_of_memory() {
        let assembly = assemble("variable a\nvariable b\nload a\nstore b").expect("assembles");
        assert_eq!(assembly.symbols.get("a").map(|s| s.value), Some(0x0FFF));
        assert_eq!(assembly.symbols.get("b").map(|s| s.value), Some(0x0FFE));
        assert_eq!(assembly.image.saved_words(), &[0x6FFF, 0x7FFE]);
    }

    #[test]
    fn allocate_moves_data_cursor() {
        let assembly =
            assemble(".constant size $10\nallocate size\nvariable after").expect("assembles");
        assert_eq!(assembly.symbols.get("after").map(|s| s.value), Some(0x0FFF - 0x10));
    }

    #[test]
    fn backward_label_reference_resolves_immediately() {
        assert_eq!(words("label top\nnop\njump top"), vec![0x0000, 0xC000]);
    }

    #[test]
    fn forward_reference_is_patched_keeping_opcode() {
        assert_eq!(
            words("jump end\nnop\nnop\nlabel end\njumpz end"),
            vec![0xC003, 0x0000, 0x0000, 0xD003]
        );
    }

    #[test]
    fn forward_reference_to_non_label_fails_with_name() {
        let err = assemble("load later\nvariable later").expect_err("variable is not a label");
        assert_eq!(err.kind, AssembleErrorKind::UnresolvedReference("later".into()));
        assert_eq!(err.location, Some(SourceLocation::line(1)));
    }

    #[test]
    fn undefined_forward_reference_fails() {
        assert_eq!(
            error_kind("jump nowhere"),
            AssembleErrorKind::UnresolvedReference("nowhere".into())
        );
    }

    #[test]
    fn single_symbol_line_emits_its_value_verbatim() {
        assert_eq!(words(".constant magic $1234\nmagic"), vec![0x1234]);
    }

    #[test]
    fn set_directive_writes_anywhere_and_extends_saved_prefix() {
        let assembly = assemble("variable v\n.set v $0042\nnop").expect("assembles");
        assert_eq!(assembly.image.words()[0x0FFF], 0x0042);
        assert_eq!(assembly.image.saved_words().len(), 4096);
        assert_eq!(assembly.code_words, 1);
    }

    #[test]
    fn set_directive_rejects_address_outside_memory() {
        assert_eq!(
            error_kind(".set $1000 $1"),
            AssembleErrorKind::AddressOutOfRange(0x1000)
        );
        assert_eq!(
            error_kind(".set nowhere $1"),
            AssembleErrorKind::UndefinedSymbol("nowhere".into())
        );
    }

    #[test]
    fn operand_limits_are_enforced() {
        assert_eq!(error_kind("literal $1000"), AssembleErrorKind::OperandTooLarge(0x1000));
        assert_eq!(words("literal $fff"), vec![0xAFFF]);
        assert_eq!(
            error_kind("literal $xyz"),
            AssembleErrorKind::MalformedNumber("$xyz".into())
        );
    }

    #[test]
    fn line_shape_errors() {
        assert_eq!(error_kind("load"), AssembleErrorKind::MissingOperand("load".into()));
        assert_eq!(error_kind("a b c d"), AssembleErrorKind::TooManyFields(4));
        assert_eq!(error_kind("frob $1"), AssembleErrorKind::UnknownCommand("frob".into()));
        assert_eq!(error_kind("frob"), AssembleErrorKind::UnknownCommand("frob".into()));
        assert_eq!(error_kind(".end"), AssembleErrorKind::StrayEnd);
        assert_eq!(error_kind("load a b"), AssembleErrorKind::UnknownCommand("load".into()));
    }

    #[test]
    fn constant_operand_wider_than_twelve_bits_is_rejected() {
        let err = assemble(".constant big $1234\nliteral big").expect_err("operand overflow");
        assert_eq!(err.kind, AssembleErrorKind::OperandTooLarge(0x1234));
        assert_eq!(err.location, Some(SourceLocation::line(2)));

        assert_eq!(words(".constant big $1234\nbig"), vec![0x1234]);
    }

    #[test]
    fn variables_above_operand_range_are_rejected_in_large_memories() {
        let config = AssemblerConfig {
            memory_size: MemorySize::W8192,
            ..AssemblerConfig::default()
        };
        let err = assemble_with("variable v\n.set v $0042\nload v", &config)
            .expect_err("variable at 0x1fff is unreachable");
        assert_eq!(err.kind, AssembleErrorKind::OperandTooLarge(0x1FFF));
        assert_eq!(err.location, Some(SourceLocation::line(3)));
    }

    #[test]
    fn forward_label_above_operand_range_is_rejected() {
        let config = AssemblerConfig {
            memory_size: MemorySize::W8192,
            ..AssemblerConfig::default()
        };
        let source = format!("jump far\n{}label far\nnop", "nop\n".repeat(0x1000));
        let err = assemble_with(&source, &config).expect_err("label at 0x1001");
        assert_eq!(err.kind, AssembleErrorKind::OperandTooLarge(0x1001));
        assert_eq!(err.location, Some(SourceLocation::line(1)));
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        assert_eq!(
            error_kind("label x\nvariable x"),
            AssembleErrorKind::DuplicateDefinition("x".into())
        );
        assert_eq!(
            error_kind("macro m\n.end\nmacro m\n.end"),
            AssembleErrorKind::DuplicateDefinition("m".into())
        );
    }

    #[test]
    fn macro_body_is_emitted_per_invocation() {
        let source = "macro twice\nadd $1\nadd $1\n.end\ntwice\ntwice";
        assert_eq!(words(source), vec![0x3001; 4]);
    }

    #[test]
    fn macro_label_collides_on_second_invocation() {
        let err = assemble("macro spin\nlabel here\njump here\n.end\nspin\nspin")
            .expect_err("second expansion redefines the label");
        assert_eq!(err.kind, AssembleErrorKind::DuplicateDefinition("here".into()));
        assert_eq!(err.location, Some(SourceLocation::in_macro(1, "spin")));
    }

    #[test]
    fn macros_may_invoke_earlier_macros() {
        let source = "macro one\nor $1\n.end\nmacro two\none\none\n.end\ntwo";
        assert_eq!(words(source), vec![0x0001, 0x0001]);
    }

    #[test]
    fn unterminated_macro_is_an_error() {
        let err = assemble("nop\nmacro open\nnop").expect_err("missing .end");
        assert_eq!(err.kind, AssembleErrorKind::UnterminatedMacro("open".into()));
        assert_eq!(err.location, Some(SourceLocation::line(2)));
    }

    #[test]
    fn recursive_macro_hits_depth_limit() {
        let config = AssemblerConfig {
            max_macro_depth: 4,
            ..AssemblerConfig::default()
        };
        let err = assemble_with("macro r\nnop\nr\n.end\nr", &config).expect_err("unbounded");
        assert_eq!(
            err.kind,
            AssembleErrorKind::MacroDepthExceeded {
                name: "r".into(),
                limit: 4
            }
        );
    }

    #[test]
    fn nested_macro_definition_is_rejected_on_expansion() {
        let err = assemble("macro outer\nmacro inner\n.end\nouter").expect_err("nested");
        assert_eq!(err.kind, AssembleErrorKind::NestedMacro("inner".into()));
    }

    #[test]
    fn code_running_into_variables_exhausts_space() {
        let config = AssemblerConfig {
            memory_size: MemorySize::new(16).expect("valid size"),
            ..AssemblerConfig::default()
        };
        let source = "allocate $c\n".to_owned() + &"nop\n".repeat(4);
        let err = assemble_with(&source, &config).expect_err("collision");
        assert_eq!(err.kind, AssembleErrorKind::SpaceExhausted);

        assert!(assemble_with(&"nop\n".repeat(2), &config).is_ok());
    }

    #[test]
    fn trailing_allocate_is_caught_after_the_pass() {
        let config = AssemblerConfig {
            memory_size: MemorySize::new(16).expect("valid size"),
            ..AssemblerConfig::default()
        };
        let err = assemble_with("nop\nnop\nallocate $d", &config).expect_err("collision");
        assert_eq!(err.kind, AssembleErrorKind::SpaceExhausted);
        assert_eq!(err.location, None);
    }

    #[test]
    fn listing_covers_code_only() {
        let assembly = assemble("literal $5\nset $1\n.set $100 $7").expect("assembles");
        let listing: Vec<String> = assembly.listing().iter().map(DisassemblyRow::text).collect();
        assert_eq!(listing, vec!["literal $005", "set.flags"]);
    }
}
