/// Definitions evaluated into every fresh interpreter, after the builtins.
pub const PRELUDE: &str = r#"
(def! not (fn* (a) (if a false true)))

(defmacro! cond
  (fn* (& xs)
    (if (> (count xs) 0)
      (list 'if (first xs)
            (if (> (count xs) 1)
              (nth xs 1)
              (throw "odd number of forms to cond"))
            (cons 'cond (rest (rest xs)))))))
"#;
