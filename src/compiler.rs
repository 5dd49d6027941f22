//! Модуль `compiler`
//!
//! Драйвер: читает конструкции верхнего уровня одну за другой, понижает
//! каждую и в конце ввода финализирует единицу компиляции.
//!
//! Первая же ошибка прерывает компиляцию целиком: следующие конструкции
//! не разбираются, частичный результат не финализируется и не пишется.

use std::fmt::Display;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::info;

use crate::backend::Backend;
use crate::error::CompileResult;
use crate::interpreter::Interpreter;
use crate::ir::{IrBackend, IrModule};
use crate::lower::Lowerer;
use crate::parser::Parser;

/// Имя модуля по умолчанию.
pub const DEFAULT_MODULE_NAME: &str = "Waterkoker";

/// Файл результата по умолчанию.
pub const DEFAULT_OUTPUT: &str = "tas.bc";

/// Настройки драйвера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub module_name: String,
    pub output: PathBuf,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            module_name: DEFAULT_MODULE_NAME.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// Скомпилировать весь ввод указанным бэкендом.
pub fn compile<R: Read, B: Backend>(reader: R, backend: B) -> CompileResult<B::Output> {
    let mut lowerer = Lowerer::new(backend);
    let mut count = 0usize;

    for node in Parser::new(reader) {
        lowerer.lower(node?)?;
        count += 1;
    }

    info!("lowered {} top-level constructs", count);
    lowerer.finish()
}

/// Скомпилировать исходный текст в IR.
pub fn compile_str(source: &str) -> CompileResult<IrModule> {
    compile(source.as_bytes(), IrBackend::new(DEFAULT_MODULE_NAME))
}

/// Скомпилировать ввод и записать результат в файл.
///
/// Файл создаётся только после успешной финализации.
pub fn compile_to_file<R, B>(reader: R, backend: B, path: &Path) -> CompileResult<()>
where
    R: Read,
    B: Backend,
    B::Output: Display,
{
    let output = compile(reader, backend)?;
    fs::write(path, output.to_string())?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Скомпилировать исходный текст и выполнить все точки входа.
pub fn run_str(source: &str) -> CompileResult<Vec<i16>> {
    let module = compile_str(source)?;
    Interpreter::new(&module).run_entry_points()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::parser::ParseError;

    #[test]
    fn test_default_options() {
        let options = CompileOptions::default();
        assert_eq!(options.module_name, "Waterkoker");
        assert_eq!(options.output, PathBuf::from("tas.bc"));
    }

    #[test]
    fn test_compile_str() {
        let module = compile_str("d-a0a1. f0 9i4.").unwrap();
        assert_eq!(module.name, "Waterkoker");
        let text = module.to_string();
        assert!(text.contains("define i16 @f0("));
        assert!(text.contains("define i16 @main() {"));
        assert!(text.contains("sub i16 %a0, %a1"));
    }

    #[test]
    fn test_run_str() {
        assert_eq!(run_str("d-a0a1. f0 9i4.").unwrap(), vec![5]);
        assert_eq!(run_str("-12").unwrap(), vec![-1]);
        assert_eq!(run_str("").unwrap(), Vec::<i16>::new());
    }

    #[test]
    fn test_first_error_stops_compilation() {
        // Ошибка в первой конструкции; синтаксическая ошибка дальше
        // уже не достигается.
        assert_eq!(
            compile_str("a1 +1").unwrap_err(),
            CompileError::UndefinedVariable(1)
        );
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            compile_str("1 +1"),
            Err(CompileError::Parse(ParseError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_compile_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tas.bc");
        compile_to_file("+12".as_bytes(), IrBackend::new("Waterkoker"), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("; ModuleID = 'Waterkoker'"));
        assert!(text.contains("add i16 1, 2"));
    }

    #[test]
    fn test_no_output_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tas.bc");
        let result = compile_to_file("1 a0".as_bytes(), IrBackend::new("Waterkoker"), &path);

        assert_eq!(result, Err(CompileError::UndefinedVariable(0)));
        assert!(!path.exists());
    }
}
