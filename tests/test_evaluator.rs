//! Evaluator tests — values, operators, closures, builtins, contract and
//! event statements

use num_bigint::BigInt;

use heura_lang::evaluator;
use heura_lang::lexer::Lexer;
use heura_lang::object::environment::Env;
use heura_lang::object::Object;
use heura_lang::parser::Parser;

fn run(source: &str) -> Object {
    let env = evaluator::new_env();
    run_in(source, &env)
}

fn run_in(source: &str, env: &Env) -> Object {
    let tokens = Lexer::new(source).tokenize();
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    assert!(
        parser.errors().is_empty(),
        "unexpected parse errors: {:?}",
        parser.errors()
    );
    evaluator::eval_program(&program, env).unwrap_or(Object::Null)
}

fn run_err(source: &str) -> String {
    match run(source) {
        Object::Error(message) => message,
        other => panic!("expected error, got {:?}", other),
    }
}

fn int(value: i64) -> Object {
    Object::Integer(BigInt::from(value))
}

// ── Literals ────────────────────────────────────────────────

#[test]
fn integer_literal() {
    assert_eq!(run("5"), int(5));
}

#[test]
fn boolean_literals() {
    assert_eq!(run("true"), Object::Boolean(true));
    assert_eq!(run("false"), Object::Boolean(false));
}

#[test]
fn string_literal() {
    assert_eq!(run("\"hello\""), Object::Str("hello".to_string()));
}

#[test]
fn bytes_literal_is_lowercased() {
    assert_eq!(run("0xAbCd"), Object::Bytes("0xabcd".to_string()));
}

// ── Arithmetic & comparison ─────────────────────────────────

#[test]
fn arithmetic() {
    assert_eq!(run("1 + 2 * 3"), int(7));
    assert_eq!(run("(1 + 2) * 3"), int(9));
    assert_eq!(run("10 - 4"), int(6));
    assert_eq!(run("10 / 3"), int(3));
}

#[test]
fn arbitrary_precision_addition() {
    let expected = BigInt::parse_bytes(b"18446744073709551614", 10).unwrap();
    assert_eq!(
        run("9223372036854775807 + 9223372036854775807"),
        Object::Integer(expected)
    );
}

#[test]
fn unary_minus_near_i64_bounds() {
    assert_eq!(run("return -9223372036854775807;"), int(-9223372036854775807));
}

#[test]
fn division_by_zero() {
    assert_eq!(run_err("1 / 0"), "division by zero");
}

#[test]
fn comparisons() {
    assert_eq!(run("1 < 2"), Object::Boolean(true));
    assert_eq!(run("2 > 3"), Object::Boolean(false));
    assert_eq!(run("1 == 1"), Object::Boolean(true));
    assert_eq!(run("1 != 1"), Object::Boolean(false));
}

#[test]
fn bang_operator() {
    assert_eq!(run("!true"), Object::Boolean(false));
    assert_eq!(run("!!true"), Object::Boolean(true));
    assert_eq!(run("!5"), Object::Boolean(false));
}

#[test]
fn string_concatenation() {
    assert_eq!(run("\"a\" + \"b\""), Object::Str("ab".to_string()));
}

#[test]
fn string_equality_is_structural() {
    assert_eq!(run("\"a\" == \"a\""), Object::Boolean(true));
    assert_eq!(run("\"a\" != \"b\""), Object::Boolean(true));
}

#[test]
fn string_ordering_is_not_defined() {
    assert_eq!(run_err("\"a\" < \"b\""), "unknown operator: STRING < STRING");
}

#[test]
fn type_mismatch() {
    assert_eq!(run_err("5 + true"), "type mismatch: INTEGER + BOOLEAN");
}

#[test]
fn cross_kind_equality() {
    assert_eq!(run("5 == true"), Object::Boolean(false));
    assert_eq!(run("0xab == \"ab\""), Object::Boolean(false));
}

// ── If expressions ──────────────────────────────────────────

#[test]
fn if_else() {
    assert_eq!(run("if (1 < 2) { 10 } else { 20 }"), int(10));
    assert_eq!(run("if (1 > 2) { 10 } else { 20 }"), int(20));
}

#[test]
fn if_without_else_yields_null() {
    assert_eq!(run("if (false) { 10 }"), Object::Null);
}

// ── Let & identifiers ───────────────────────────────────────

#[test]
fn let_binding() {
    assert_eq!(run("let a = 5; a"), int(5));
}

#[test]
fn multi_value_let() {
    assert_eq!(run("let a, b = 10, 20; return a + b;"), int(30));
}

#[test]
fn multi_value_let_arity_mismatch() {
    assert_eq!(
        run_err("let a, b = 1"),
        "length of let and values is different: 2, 1"
    );
}

#[test]
fn single_name_binds_whole_tuple() {
    assert_eq!(run("let a = 1, 2; a"), Object::Multiple(vec![int(1), int(2)]));
}

#[test]
fn unknown_identifier() {
    assert_eq!(run_err("foobar"), "identifier not found: foobar");
}

// ── Functions & closures ────────────────────────────────────

#[test]
fn function_call() {
    assert_eq!(run("fn add(a, b) { return a + b; } add(2, 3)"), int(5));
}

#[test]
fn early_return() {
    assert_eq!(run("fn f() { return 1; return 2; } f()"), int(1));
}

#[test]
fn return_unwinds_through_if() {
    assert_eq!(run("fn f() { if (true) { return 10; } return 20; } f()"), int(10));
}

#[test]
fn empty_function_returns_null() {
    assert_eq!(run("fn f() { } let x = f(); x"), Object::Null);
}

#[test]
fn recursion() {
    let source = "fn fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } fib(10)";
    assert_eq!(run(source), int(55));
}

// The captured environment is a shared reference: rebinding a name in the
// defining scope is observed by the closure.
#[test]
fn closure_sees_rebinding_in_defining_scope() {
    assert_eq!(run("let x = 1; fn f() { return x; } let x = 2; f()"), int(2));
}

#[test]
fn closure_captures_defining_scope() {
    let source = "let x = 1; fn outer() { let x = 10; fn inner() { return x; } return inner(); } outer()";
    assert_eq!(run(source), int(10));
}

#[test]
fn call_arity_mismatch() {
    assert_eq!(
        run_err("fn f(a) { return a; } f()"),
        "wrong number of arguments. got=0, want=1"
    );
}

#[test]
fn calling_a_non_function() {
    assert_eq!(run_err("let x = 1; x()"), "not a function: INTEGER");
}

// ── Arrays ──────────────────────────────────────────────────

#[test]
fn array_indexing() {
    assert_eq!(run("let arr = [1, 2, 3]; arr[0]"), int(1));
    assert_eq!(run("[1, 2, 3][2]"), int(3));
}

#[test]
fn array_index_out_of_range() {
    assert_eq!(run("[1, 2, 3][3]"), Object::Null);
    assert_eq!(run("[1, 2, 3][-1]"), Object::Null);
}

#[test]
fn array_builtins() {
    assert_eq!(run("let arr = [1, 2, 3]; len(arr)"), int(3));
    assert_eq!(run("first([1, 2, 3])"), int(1));
    assert_eq!(run("last([1, 2, 3])"), int(3));
    assert_eq!(run("rest([1, 2, 3])"), Object::Array(vec![int(2), int(3)]));
    assert_eq!(
        run("push([1, 2, 3], 4)"),
        Object::Array(vec![int(1), int(2), int(3), int(4)])
    );
}

#[test]
fn push_does_not_mutate() {
    assert_eq!(run("let arr = [1]; push(arr, 2); arr"), Object::Array(vec![int(1)]));
}

#[test]
fn len_on_string() {
    assert_eq!(run("len(\"hello\")"), int(5));
}

#[test]
fn len_wrong_kind() {
    assert_eq!(run_err("len(5)"), "argument to `len` not supported, got INTEGER");
}

// ── Hashes ──────────────────────────────────────────────────

#[test]
fn hash_dot_access() {
    assert_eq!(run("let h = {\"a\": 1}; h.a"), int(1));
}

#[test]
fn hash_bracket_access() {
    assert_eq!(run("let h = {\"a\": 1}; h[\"a\"]"), int(1));
}

#[test]
fn hash_missing_key_is_null() {
    assert_eq!(run("let h = {\"a\": 1}; h.b"), Object::Null);
}

#[test]
fn hash_nested_dot_access() {
    assert_eq!(run("let h = {\"a\": {\"b\": 2}}; h.a.b"), int(2));
}

#[test]
fn hash_integer_and_boolean_keys() {
    assert_eq!(run("{1: \"one\", true: \"yes\"}[1]"), Object::Str("one".to_string()));
    assert_eq!(run("{true: \"yes\"}[true]"), Object::Str("yes".to_string()));
}

#[test]
fn unusable_hash_key() {
    assert_eq!(run_err("{[1]: 2}"), "unusable as hash key: ARRAY");
}

// ── Unit multipliers ────────────────────────────────────────

#[test]
fn ether_multiplier() {
    let expected = BigInt::parse_bytes(b"1000000000000000000", 10).unwrap();
    assert_eq!(run("ether(1)"), Object::Integer(expected));
}

#[test]
fn unit_multipliers() {
    assert_eq!(run("kwei(2)"), int(2_000));
    assert_eq!(run("mwei(2)"), int(2_000_000));
    assert_eq!(run("gwei(5)"), int(5_000_000_000));
    assert_eq!(run("szabo(1)"), int(1_000_000_000_000));
    assert_eq!(run("finney(1)"), int(1_000_000_000_000_000));
}

#[test]
fn unit_multiplier_wrong_kind() {
    assert_eq!(run_err("ether(\"1\")"), "expected number, got STRING");
}

// ── Accounts ────────────────────────────────────────────────

#[test]
fn account_from_bytes() {
    let result = run("Account(0xdac17f958d2ee523a2206206994597c13d831ec7)");
    assert_eq!(
        result,
        Object::Account("0xdac17f958d2ee523a2206206994597c13d831ec7".to_string())
    );
}

#[test]
fn account_from_short_bytes_fails() {
    assert!(run_err("Account(0x01)").contains("not an address"));
}

// ── Artifacts & contracts ───────────────────────────────────

#[test]
fn artifact_binds_a_contract() {
    let result = run("artifact ERC20 ERC20");
    match result {
        Object::Contract(contract) => {
            assert_eq!(contract.name, "ERC20");
            assert!(contract.abi.functions.contains_key("balanceOf"));
            assert!(contract.abi.events.contains_key("Transfer"));
        }
        other => panic!("expected contract, got {:?}", other),
    }
}

#[test]
fn unknown_builtin_artifact() {
    assert_eq!(run_err("artifact ERC721"), "builtin artifact ERC721 not found");
}

#[test]
fn calling_a_contract_binds_an_instance() {
    let result = run("artifact ERC20 let c = ERC20(0xdac17f958d2ee523a2206206994597c13d831ec7); c");
    match result {
        Object::Instance(instance) => {
            assert_eq!(instance.name, "ERC20");
            assert_eq!(instance.address, "0xdac17f958d2ee523a2206206994597c13d831ec7");
        }
        other => panic!("expected instance, got {:?}", other),
    }
}

#[test]
fn contract_call_needs_exactly_one_argument() {
    assert_eq!(run_err("artifact ERC20 ERC20()"), "expected 1 value, found 0");
}

#[test]
fn first_artifact_binding_wins() {
    let env = evaluator::new_env();
    run_in("artifact ERC20", &env);
    let first = run_in("ERC20", &env);
    run_in("artifact ERC20", &env);
    let second = run_in("ERC20", &env);
    assert_eq!(first, second);
}

#[test]
fn instance_call_without_endpoint_fails() {
    let source = "artifact ERC20 \
                  let c = ERC20(0xdac17f958d2ee523a2206206994597c13d831ec7); \
                  c.balanceOf(0xdac17f958d2ee523a2206206994597c13d831ec7)";
    assert_eq!(run_err(source), "endpoint not found");
}

// ── Imports ─────────────────────────────────────────────────

#[test]
fn unknown_import() {
    assert_eq!(run_err("import web3"), "plugin web3 not found");
}

#[test]
fn import_binds_plugin() {
    let env = evaluator::new_env();
    run_in("import account", &env);
    let bound = env.borrow().get("account");
    assert!(matches!(bound, Some(Object::Builtin(_))));
}

// ── Environment seeding ─────────────────────────────────────

#[test]
fn env_hash_lookup_is_idempotent() {
    let env = evaluator::new_env();
    env.borrow_mut()
        .build_envs(vec![("X".to_string(), "1".to_string())].into_iter());
    assert_eq!(run_in("env[\"X\"]", &env), Object::Str("1".to_string()));
    assert_eq!(run_in("env[\"X\"]", &env), Object::Str("1".to_string()));
}

#[test]
fn args_array() {
    let env = evaluator::new_env();
    env.borrow_mut().build_args(&["script.hra".to_string()]);
    assert_eq!(run_in("len(args)", &env), int(1));
    assert_eq!(run_in("first(args)", &env), Object::Str("script.hra".to_string()));
}

#[test]
fn endpoint_lookup() {
    let env = evaluator::new_env();
    env.borrow_mut()
        .set("endpoint", Object::Str("http://localhost:8545".to_string()));
    assert_eq!(
        run_in("endpoint", &env),
        Object::Str("http://localhost:8545".to_string())
    );
}

// ── On statements ───────────────────────────────────────────

const ON_TRANSFER: &str = "artifact ERC20 \
    on ERC20(0xdac17f958d2ee523a2206206994597c13d831ec7).Transfer(from, to, value) { print(from) }";

#[test]
fn on_statement_registers_an_event() {
    let env = evaluator::new_env();
    run_in(ON_TRANSFER, &env);

    let events = env.borrow().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].contract, "ERC20");
    assert_eq!(events[0].method, "Transfer");
    assert_eq!(
        events[0].address.as_deref(),
        Some("0xdac17f958d2ee523a2206206994597c13d831ec7")
    );

    // registered under the synthesized name
    let registered = env.borrow().get("ERC20_Transfer");
    assert!(matches!(registered, Some(Object::Event(_))));
}

#[test]
fn on_statement_without_filter() {
    let env = evaluator::new_env();
    run_in("artifact ERC20 on ERC20.Transfer(from, to, value) { }", &env);
    assert_eq!(env.borrow().events()[0].address, None);
}

#[test]
fn on_statement_unknown_contract() {
    assert_eq!(run_err("on Foo.Transfer(a, b, c) { }"), "contract not found");
}

#[test]
fn on_statement_unknown_event() {
    assert_eq!(
        run_err("artifact ERC20 on ERC20.Burn(a) { }"),
        "event Burn not found on contract"
    );
}

#[test]
fn on_statement_arity_mismatch() {
    assert_eq!(
        run_err("artifact ERC20 on ERC20.Transfer(from, to) { }"),
        "event arity is different: 3 and 2"
    );
}

#[test]
fn on_statement_failure_leaves_env_unchanged() {
    let env = evaluator::new_env();
    let result = run_in("artifact ERC20 on ERC20.Transfer(from, to) { }", &env);
    assert!(result.is_error());
    assert!(env.borrow().events().is_empty());
}

#[test]
fn on_statement_on_a_non_contract() {
    assert_eq!(
        run_err("let ERC20 = 1; on ERC20.Transfer(a, b, c) { }"),
        "object found but it is no contract"
    );
}
