use pretty_assertions::assert_eq;
use purah_lang::interpreter::error::{Error, RuntimeError};
use purah_lang::interpreter::interpreter::Interpreter;
use purah_lang::interpreter::lexer::LexerError;
use purah_lang::interpreter::memory::MemoryError;
use purah_lang::interpreter::parser::ParseError;
use purah_lang::interpreter::value::ValueType;
use purah_lang::{run_source, tokenize_lines};

fn run(source: &str) -> (Result<i64, Error>, String) {
    let _ = env_logger::try_init();

    let mut output: Vec<u8> = Vec::new();
    let result = run_source(source, &mut output);
    (result, String::from_utf8(output).unwrap())
}

#[test]
fn branch() {
    let src = include_str!("./files/branch.purah");
    assert_eq!(run(src).0.unwrap(), 10);

    let changed = src.replace("var x\\int = 2;", "var x\\int = 3;");
    assert_eq!(run(&changed).0.unwrap(), 0);
}

#[test]
fn overloads() {
    let (result, output) = run(include_str!("./files/overloads.purah"));
    assert_eq!(result.unwrap(), 3);
    assert_eq!(output, "ab ");
}

#[test]
fn overload_without_match() {
    let src = include_str!("./files/overloads.purah").replace("return add(1, 2);", "return add(1, \"b\");");
    let (result, output) = run(&src);

    match result {
        Err(Error::Semantic(RuntimeError::UnresolvedFunction { signature, line })) => {
            assert_eq!(signature, "add(int, string)");
            assert_eq!(line, 12);
        },
        other => panic!("expected an unresolved call, got {:?}", other),
    }

    // Output before the failing call is kept
    assert_eq!(output, "ab ");
}

#[test]
fn factorial() {
    let (result, output) = run(include_str!("./files/factorial.purah"));
    assert_eq!(result.unwrap(), 12);
    assert_eq!(output, "120");
}

#[test]
fn globals() {
    let (result, output) = run(include_str!("./files/globals.purah"));
    assert_eq!(result.unwrap(), 2);
    assert_eq!(output, "hello world\ncounted twice\n");
}

#[test]
fn return_type_is_enforced() {
    let (result, _) = run("func f\\int() { return true; }\nfunc main\\int() { return f(); }");

    assert!(matches!(result, Err(Error::Semantic(RuntimeError::ReturnTypeMismatch {
        expected: ValueType::Int, found: ValueType::Bool, line: 2, ..
    }))));
}

#[test]
fn missing_entry_point() {
    for src in [
        "func start\\int() { return 0; }",
        "func main\\int(argc\\int) { return 0; }",
    ] {
        let (result, output) = run(&format!("print \"side effect\";\n{}", src));
        assert!(matches!(result, Err(Error::Semantic(RuntimeError::MissingEntryPoint))), "{}", src);
        assert_eq!(output, "");
    }

    let (result, output) = run("print 1;\nfunc main\\float() { return 0.0; }");
    assert!(matches!(result, Err(Error::Semantic(RuntimeError::InvalidEntryPoint { found: ValueType::Float }))));
    assert_eq!(output, "");
}

#[test]
fn redeclaration_and_shadowing() {
    let (result, _) = run("func main\\int() { var x\\int = 1; var x\\int = 1; return x; }");
    assert!(matches!(result, Err(Error::Semantic(RuntimeError::Variable {
        source: MemoryError::RedefinedVariable(_), line: 1,
    }))));

    let (result, output) = run("func main\\int() {\n  var x\\int = 1;\n  if (true) {\n    var x\\int = 2;\n    print x;\n  }\n  return x;\n}");
    assert_eq!(result.unwrap(), 1);
    assert_eq!(output, "2");
}

#[test]
fn print_forms() {
    let (result, output) = run("func main\\int() { print true; print \",\"; print 2.5; print \",\"; print 7 / 2; print \",\"; print -3; return 0; }");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(output, "true,2.5,3.5,-3");
}

#[test]
fn quirks() {
    let (result, output) = run("func main\\int() { var b\\bool = true + true; print b; print \"zz\" < \"aaa\"; return 0; }");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(output, "truetrue");
}

#[test]
fn arithmetic_is_left_associative() {
    let (result, _) = run("func main\\int() { return 10 - 3 - 2 + 2 * 3 % 4; }");
    assert_eq!(result.unwrap(), 7);
}

#[test]
fn mixed_operands_fail() {
    let (result, _) = run("func main\\int() { var x\\float = 1 + 1.0; return 0; }");
    assert!(matches!(result, Err(Error::Semantic(RuntimeError::OperandMismatch { left: ValueType::Int, right: ValueType::Float, .. }))));
}

#[test]
fn no_functions() {
    let (result, output) = run("var x\\int = 1;");
    assert_eq!(result.unwrap(), -1);
    assert_eq!(output, "");
}

#[test]
fn lexical_and_syntax_errors() {
    let (result, _) = run("func main\\int() {\n  return 1.2.3;\n}");
    assert!(matches!(result, Err(Error::Lexical(LexerError::UnexpectedDot { line: 2 }))));

    let (result, _) = run("func main\\int() {\n  return (1 + 2));\n}");
    assert!(matches!(result, Err(Error::Syntax(ParseError::UnmatchedParenthesis { line: 2 }))));

    let (result, _) = run("func main\\int() {\n  while (true) { }\n  return 0;\n}");
    assert!(matches!(result, Err(Error::Syntax(ParseError::UnexpectedToken { line: 2, .. }))));
}

#[test]
fn call_depth_limit() {
    let _ = env_logger::try_init();

    let mut interpreter = Interpreter::with_max_call_depth(16);
    tokenize_lines(&mut interpreter, "func loop\\int(n\\int) { return loop(n); }\nfunc main\\int() { return loop(1); }").unwrap();

    let result = interpreter.interpret_with_output(&mut Vec::<u8>::new());
    assert!(matches!(result, Err(Error::Semantic(RuntimeError::CallDepthExceeded { limit: 16, line: 1 }))));
    assert_eq!(interpreter.heap_len(), 0);
}

#[test]
fn recursion_up_to_default_call_depth() {
    let src = "func down\\int(n\\int) {\n  if (n == 0) {\n    return 0;\n  }\n  return 1 + down(n - 1);\n}\nfunc main\\int() { return down(DEPTH); }";

    // main plus 255 nested calls fill the default limit of 256 exactly
    let (result, _) = run(&src.replace("DEPTH", "254"));
    assert_eq!(result.unwrap(), 254);

    let (result, _) = run(&src.replace("DEPTH", "255"));
    assert!(matches!(result, Err(Error::Semantic(RuntimeError::CallDepthExceeded { limit: 256, line: 5 }))));
}

#[test]
fn statements_continue_across_lines() {
    let (result, output) = run("func main\\int() {\n  var x\\int = 5\n  print x\n  -1\n  return 0\n}");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(output, "4");

    let (result, output) = run("func main\\int() {\n  var x\\int = 5;\n  print x;\n  -1;\n  return 0;\n}");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(output, "5");
}
