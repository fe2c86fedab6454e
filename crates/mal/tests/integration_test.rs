use mal::{Interpreter, InterpreterBuilder, MalError, Value};

fn eval(input: &str) -> Value {
    let interp = Interpreter::new();
    interp
        .eval_str(input)
        .unwrap_or_else(|e| panic!("failed to eval {input}: {e}"))
}

fn rep(interp: &Interpreter, input: &str) -> String {
    interp
        .rep(input)
        .unwrap_or_else(|e| panic!("failed to eval {input}: {e}"))
}

fn eval_err(input: &str) -> MalError {
    let interp = Interpreter::new();
    match interp.eval_str(input) {
        Ok(v) => panic!("expected {input} to fail, got {v}"),
        Err(e) => e,
    }
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

#[test]
fn test_arithmetic_identities() {
    assert_eq!(eval("(+ 1 2 3)"), num(6.0));
    assert_eq!(eval("(+)"), num(0.0));
    assert_eq!(eval("(+ 4)"), num(4.0));
    assert_eq!(eval("(*)"), num(1.0));
    assert_eq!(eval("(* 4)"), num(4.0));
    assert_eq!(eval("(- 5)"), num(-5.0));
    assert_eq!(eval("(- 10 3 2)"), num(5.0));
    assert_eq!(eval("(/ 2)"), num(0.5));
    assert_eq!(eval("(/ 12 3 2)"), num(2.0));
    assert!(matches!(eval_err("(-)"), MalError::Arity { .. }));
    assert!(matches!(eval_err("(/)"), MalError::Arity { .. }));
    assert!(matches!(eval_err("(/ 1 0)"), MalError::Eval(_)));
    assert!(matches!(eval_err("(+ 1 \"a\")"), MalError::Type { .. }));
}

#[test]
fn test_let_star_sequential_bindings() {
    assert_eq!(eval("(let* (a 1 b (+ a 1)) (+ a b))"), num(3.0));
}

#[test]
fn test_tail_recursion_does_not_grow_stack() {
    let interp = Interpreter::new();
    interp
        .eval_str("(def! loop (fn* (n) (if (= n 0) :done (loop (- n 1)))))")
        .unwrap();
    assert_eq!(interp.eval_str("(loop 100000)").unwrap(), Value::keyword("done"));
}

#[test]
fn test_tail_position_in_do_and_let() {
    let interp = Interpreter::new();
    interp
        .eval_str(
            "(def! sum-to (fn* (n acc) (let* (m (- n 1)) (do (if (< n 1) acc (sum-to m (+ acc n)))))))",
        )
        .unwrap();
    assert_eq!(interp.eval_str("(sum-to 50000 0)").unwrap(), num(1250025000.0));
}

#[test]
fn test_quasiquote() {
    let interp = Interpreter::new();
    assert_eq!(rep(&interp, "(quasiquote (1 ~(+ 1 1) ~@(list 3 4)))"), "(1 2 3 4)");
    assert_eq!(rep(&interp, "(def! lst '(b c))"), "(b c)");
    assert_eq!(rep(&interp, "`(a ~lst d)"), "(a (b c) d)");
    assert_eq!(rep(&interp, "`(a ~@lst d)"), "(a b c d)");
    assert_eq!(rep(&interp, "`[1 ~@lst]"), "[1 b c]");
}

#[test]
fn test_macro_receives_unevaluated_arguments() {
    let interp = Interpreter::new();
    interp
        .eval_str("(defmacro! unless (fn* (pred a b) `(if ~pred ~b ~a)))")
        .unwrap();
    assert_eq!(interp.eval_str("(unless false 7 8)").unwrap(), num(7.0));
    // Only the chosen branch is evaluated.
    assert_eq!(
        interp.eval_str("(unless true (throw :never) 8)").unwrap(),
        num(8.0)
    );
    assert_eq!(rep(&interp, "(macroexpand (unless p x y))"), "(if p y x)");
}

#[test]
fn test_cons_and_concat_are_pure() {
    let interp = Interpreter::new();
    assert_eq!(rep(&interp, "(cons 1 (list 2 3))"), "(1 2 3)");
    assert_eq!(rep(&interp, "(concat (list 1 2) (list 3 4))"), "(1 2 3 4)");

    interp.eval_str("(def! a (list 1 2))").unwrap();
    interp.eval_str("(def! b [3 4])").unwrap();
    interp.eval_str("(def! c (cons 0 a))").unwrap();
    interp.eval_str("(def! d (concat a b a))").unwrap();
    assert_eq!(rep(&interp, "a"), "(1 2)");
    assert_eq!(rep(&interp, "b"), "[3 4]");
    assert_eq!(rep(&interp, "c"), "(0 1 2)");
    assert_eq!(rep(&interp, "d"), "(1 2 3 4 1 2)");
}

#[test]
fn test_closures_capture_defining_environment() {
    let interp = Interpreter::new();
    interp.eval_str("(def! f (let* (x 1) (fn* () x)))").unwrap();
    assert_eq!(interp.eval_str("(let* (x 2) (f))").unwrap(), num(1.0));

    interp
        .eval_str("(def! make-adder (fn* (n) (fn* (x) (+ x n))))")
        .unwrap();
    interp.eval_str("(def! add5 (make-adder 5))").unwrap();
    assert_eq!(interp.eval_str("(add5 10)").unwrap(), num(15.0));
}

#[test]
fn test_error_kinds() {
    assert!(matches!(eval_err("(let* (a) a)"), MalError::Arity { .. }));
    assert!(matches!(eval_err("(foo)").inner(), MalError::Unbound(name) if name == "foo"));
    assert!(matches!(eval_err("(1 2 3)"), MalError::Type { .. }));
    assert!(matches!(eval_err("(1 2"), MalError::Reader { .. }));
    assert!(matches!(eval_err("{:a}"), MalError::Reader { .. }));
    assert!(matches!(eval_err("{(1) 2}"), MalError::Reader { .. }));
    assert!(matches!(eval_err("(throw 42)"), MalError::UserException(v) if v == num(42.0)));
}

#[test]
fn test_errors_abort_only_the_current_form() {
    let interp = Interpreter::new();
    interp.eval_str("(def! x 1)").unwrap();
    assert!(interp.eval_str("(def! x (undefined))").is_err());
    assert_eq!(interp.eval_str("x").unwrap(), num(1.0));
}

#[test]
fn test_print_read_round_trip_for_atoms() {
    let interp = Interpreter::new();
    for literal in ["42", "-3.5", "\"a \\\"q\\\" \\\\ \\n\"", "true", "false", "nil", ":kw", "sym"] {
        let printed = rep(&interp, &format!("(pr-str '{literal})"));
        let reread = interp
            .eval_str(&format!("(= (read-string {printed}) '{literal})"))
            .unwrap();
        assert_eq!(reread, Value::Bool(true), "{literal}");
    }
}

#[test]
fn test_printing() {
    let interp = Interpreter::new();
    assert_eq!(rep(&interp, "\"a\\nb\""), "\"a\\nb\"");
    assert_eq!(rep(&interp, "(str \"a\" 1 :k)"), "\"a1:k\"");
    assert_eq!(rep(&interp, "{:a [1 \"x\"]}"), "{:a [1 \"x\"]}");
    assert_eq!(rep(&interp, "(fn* (x) x)"), "#<function>");
    assert_eq!(rep(&interp, "(atom 1)"), "(atom 1)");
    assert_eq!(rep(&interp, "1.5"), "1.5");
}

#[test]
fn test_hash_maps_use_structural_keys() {
    let interp = Interpreter::new();
    assert_eq!(
        interp
            .eval_str("(get (assoc {} \"k\" 1) (str \"k\"))")
            .unwrap(),
        num(1.0)
    );
    assert_eq!(
        interp.eval_str("(contains? (hash-map 1 :a) (+ 0 1))").unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_atoms() {
    let interp = Interpreter::new();
    interp.eval_str("(def! counter (atom 0))").unwrap();
    interp.eval_str("(def! inc! (fn* () (swap! counter + 1)))").unwrap();
    interp.eval_str("(inc!) (inc!) (inc!)").unwrap();
    assert_eq!(interp.eval_str("@counter").unwrap(), num(3.0));
    assert_eq!(interp.eval_str("(reset! counter 10)").unwrap(), num(10.0));
    assert_eq!(interp.eval_str("(deref counter)").unwrap(), num(10.0));
}

#[test]
fn test_try_catch() {
    let interp = Interpreter::new();
    assert_eq!(
        rep(&interp, "(try* (throw {:msg \"bad\"}) (catch* e (get e :msg)))"),
        "\"bad\""
    );
    assert_eq!(
        rep(&interp, "(try* (nth (list 1) 5) (catch* e (string? e)))"),
        "true"
    );
}

#[test]
fn test_prelude() {
    let interp = Interpreter::new();
    assert_eq!(rep(&interp, "(not nil)"), "true");
    assert_eq!(rep(&interp, "(cond false 1 (= 1 1) 2 true 3)"), "2");
}

#[test]
fn test_builder_without_prelude() {
    let interp = InterpreterBuilder::new().without_prelude().build();
    assert_eq!(interp.eval_str("(+ 1 2)").unwrap(), num(3.0));
    let err = interp.eval_str("(not true)").unwrap_err();
    assert!(matches!(err.inner(), MalError::Unbound(_)));
}

#[test]
fn test_builder_without_stdlib() {
    let interp = InterpreterBuilder::new()
        .without_stdlib()
        .without_prelude()
        .build();
    assert_eq!(interp.eval_str("(if true 1 2)").unwrap(), num(1.0));
    assert!(interp.eval_str("(+ 1 2)").is_err());
}

#[test]
fn test_step_limit() {
    let interp = InterpreterBuilder::new().with_step_limit(5_000).build();
    interp
        .eval_str("(def! forever (fn* () (forever)))")
        .unwrap();
    let err = interp.eval_str("(forever)").unwrap_err();
    assert!(err.to_string().contains("evaluation step limit exceeded"));
    assert_eq!(interp.eval_str("(+ 1 1)").unwrap(), num(2.0));
}

#[test]
fn test_register_fn() {
    let interp = Interpreter::new();
    interp.register_fn("square", |args: &[Value]| match args {
        [Value::Number(n)] => Ok(Value::Number(n * n)),
        _ => Err(MalError::eval("square expects one number")),
    });
    assert_eq!(interp.eval_str("(square 7)").unwrap(), num(49.0));
    assert_eq!(rep(&interp, "(map square [1 2 3])"), "(1 4 9)");
    assert_eq!(rep(&interp, "square"), "#<builtin square>");
}

#[test]
fn test_eval_and_read_string() {
    let interp = Interpreter::new();
    assert_eq!(
        interp.eval_str("(eval (read-string \"(+ 2 3)\"))").unwrap(),
        num(5.0)
    );
    let form = mal_reader::read("(* 6 7)").unwrap();
    assert_eq!(interp.eval(&form).unwrap(), num(42.0));
}

#[test]
fn test_eval_reached_through_other_builtins() {
    let interp = Interpreter::new();
    assert_eq!(rep(&interp, "(apply eval (list '(+ 1 2)))"), "3");
    assert_eq!(rep(&interp, "(map eval (list '(+ 1 2) '(str \"a\" \"b\")))"), "(3 \"ab\")");
    interp.eval_str("(def! pending (atom '(* 6 7)))").unwrap();
    assert_eq!(rep(&interp, "(swap! pending eval)"), "42");
}

#[test]
fn test_metadata_shorthand() {
    let interp = Interpreter::new();
    assert_eq!(rep(&interp, "^{:a 1} [1 2]"), "[1 2]");
    interp.eval_str("(def! f ^{:doc \"adds one\"} (fn* (x) (+ x 1)))").unwrap();
    assert_eq!(rep(&interp, "(meta f)"), "{:doc \"adds one\"}");
    assert_eq!(rep(&interp, "(f 1)"), "2");
    assert_eq!(rep(&interp, "(meta (fn* () 1))"), "nil");
    assert_eq!(rep(&interp, "(meta (with-meta + :plus))"), ":plus");
}

#[test]
fn test_closures_ignore_surplus_arguments() {
    let interp = Interpreter::new();
    assert_eq!(rep(&interp, "((fn* (a) a) 1 2)"), "1");
    assert!(matches!(
        interp.eval_str("((fn* (a b) a) 1)").unwrap_err(),
        MalError::Arity { .. }
    ));
}
