//! Integration tests for end-to-end compilation.
//!
//! These tests drive the complete pipeline from source text through
//! tokenization, parsing, type checking and lowering into the built-in IR,
//! then verify and execute the result.

use flowc::{
    ast::ast::Node,
    compiler::{
        backend::{Backend, RuntimeValue},
        compiler::lower,
        ir::{Instruction, IrModule},
    },
    errors::errors::Error,
    format_diagnostic,
    type_checker::type_checker::type_check,
    visitor::{recorder::EventRecorder, traversal::walk},
    SourceFile,
};
use indoc::indoc;

fn parse(source: &str) -> (SourceFile, Node) {
    let file = SourceFile::new("test.flow", source);
    let root = file.parse().unwrap();
    (file, root)
}

fn check(source: &str) -> (bool, Vec<Error>) {
    let (_, root) = parse(source);
    type_check(&root, false)
}

/// Parses, type checks and lowers `source`, failing the test on any
/// diagnostic.
fn compile(source: &str) -> IrModule {
    let (_, root) = parse(source);
    let (passed, diagnostics) = type_check(&root, false);
    assert!(passed, "unexpected diagnostics: {:?}", diagnostics);

    let module = lower(&root, IrModule::new("test"), false);
    module.verify().unwrap();
    module
}

fn opcodes(module: &IrModule) -> Vec<&'static str> {
    module
        .function_instructions()
        .map(Instruction::opcode)
        .collect()
}

#[test]
fn test_declarations_compile_in_order() {
    let module = compile("int x = 5; int y = x + 2;");

    assert_eq!(
        opcodes(&module),
        vec!["alloca", "store", "alloca", "load", "add", "store", "ret"]
    );

    let result = module.execute().unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.variable("x"), Some(RuntimeValue::Int(5)));
    assert_eq!(result.variable("y"), Some(RuntimeValue::Int(7)));
}

#[test]
fn test_implicit_flow_is_rejected() {
    let source = indoc! {"
        high int x = 1;
        low int y = 0;
        if (x > 0) {
            y = 1;
        }
    "};
    let (file, root) = parse(source);
    let (passed, diagnostics) = type_check(&root, false);

    assert!(!passed);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].get_error_name(), "SecurityViolationImplicit");
    assert_eq!(diagnostics[0].get_line(), 4);

    let rendered = format_diagnostic(&diagnostics[0], Some(&file));
    assert!(rendered.starts_with("ERR: "));
    assert!(rendered.ends_with("test.flow line 4:     y = 1;"));
}

#[test]
fn test_explicit_flow_is_rejected() {
    let source = indoc! {"
        high int secret = 42;
        int public = 0;
        public = secret;
    "};
    let (passed, diagnostics) = check(source);

    assert!(!passed);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].get_error_name(), "SecurityViolationExplicit");
    assert_eq!(diagnostics[0].get_line(), 3);
}

#[test]
fn test_upward_flows_are_accepted() {
    let source = indoc! {"
        high int h = 0;
        low int l = 3;
        h = l;
        if (h > 1) {
            h = h + 1;
        } else {
            skip;
        }
    "};
    let (passed, diagnostics) = check(source);

    assert!(passed);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_non_boolean_guard_is_rejected() {
    let (passed, diagnostics) = check("if (5) { }");

    assert!(!passed);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].get_error_name(), "GuardTypeError");
    assert!(diagnostics[0].to_string().contains("`int`"));
}

#[test]
fn test_while_loop_blocks_and_edges() {
    let module = compile(indoc! {"
        int x = 0;
        while (x < 10) {
            x = x + 1;
        }
    "});

    assert_eq!(module.block_labels(), vec!["entry", "cond", "body", "end"]);
    assert_eq!(module.successors("entry"), vec!["cond"]);
    assert_eq!(module.successors("cond"), vec!["body", "end"]);
    assert_eq!(module.successors("body"), vec!["cond"]);
    assert!(module.successors("end").is_empty());

    let result = module.execute().unwrap();
    assert_eq!(result.variable("x"), Some(RuntimeValue::Int(10)));
}

#[test]
fn test_loop_computes_factorial() {
    let module = compile(indoc! {"
        // 5!
        int n = 5;
        int acc = 1;
        while (n > 0) {
            acc = acc * n;
            n = n - 1;
        }
    "});

    let result = module.execute().unwrap();
    assert_eq!(result.variable("acc"), Some(RuntimeValue::Int(120)));
    assert_eq!(result.variable("n"), Some(RuntimeValue::Int(0)));
}

#[test]
fn test_branch_on_double_comparison() {
    let module = compile(indoc! {"
        double d = 1.5;
        bool big = d > 1.0;
        if (big) {
            d = d * 2.0;
        } else {
            d = 0.0;
        }
    "});

    assert_eq!(module.block_labels(), vec!["entry", "then", "else", "merge"]);

    let result = module.execute().unwrap();
    assert_eq!(result.variable("big"), Some(RuntimeValue::Bool(true)));
    assert_eq!(result.variable("d"), Some(RuntimeValue::Double(3.0)));
}

#[test]
fn test_shadowing_in_nested_block() {
    let module = compile(indoc! {"
        int x = 1;
        {
            int x = 2;
            x = x + 10;
        }
        x = x + 100;
    "});

    let result = module.execute().unwrap();
    let values: Vec<RuntimeValue> = result.variables.iter().map(|(_, value)| *value).collect();
    assert_eq!(values, vec![RuntimeValue::Int(101), RuntimeValue::Int(12)]);
}

#[test]
fn test_emitted_text() {
    let module = compile("int x = 0; while (x < 3) { x = x + 1; }");
    let text = module.to_string();

    assert!(text.starts_with("; ModuleID = 'test'"));
    assert!(text.contains("define i32 @main() {"));
    assert!(text.contains("br label %cond"));
    assert!(text.contains("icmp slt"));
    assert!(text.trim_end().ends_with('}'));
}

#[test]
fn test_parse_error_has_location() {
    let file = SourceFile::new("broken.flow", "int x = 1;\nint y = ;\n");
    let error = file.parse().unwrap_err();

    assert_eq!(error.get_line(), 2);
    assert_eq!(
        format_diagnostic(&error, Some(&file)).lines().nth(1),
        Some("broken.flow line 2: int y = ;")
    );
}

#[test]
fn test_event_dump_of_small_program() {
    let (_, root) = parse("low int x = 1; x = x + 1;");
    let mut recorder = EventRecorder::new();
    walk(&root, &mut recorder);

    assert_eq!(
        recorder.lines(),
        vec![
            "Block(Enter)",
            "TypeAnnotation",
            "SecurityAnnotation",
            "VariableDeclaration",
            "IntLiteral",
            "Assignment",
            "Identifier",
            "IntLiteral",
            "BinaryOp",
            "Assignment",
            "Block(Exit)",
        ]
    );
}
