use lambdakit::expression::Binding;
use lambdakit::{
    coalesce, codec, combine, compose, DataType, Expression, ExpressionError, Lambda, ObjectType,
    Parameter, Predicate, PredicateBuilder, Projection, Value,
};
use rand::rngs::ThreadRng;
use rand::Rng;
use std::sync::Arc;
use std::thread;

const SAMPLES: usize = 64;

fn int(name: &str) -> Parameter {
    Parameter::new(name, DataType::Int32)
}

fn random_inputs(rng: &mut ThreadRng) -> Vec<i32> {
    (0..SAMPLES).map(|_| rng.gen_range(-1000..1000)).collect()
}

/// `name => name > bound`
fn greater_than(name: &str, bound: i32) -> Predicate {
    let p = int(name);
    Predicate::from_body(p.clone(), Expression::gt(p.to_expr(), Expression::int32(bound))).unwrap()
}

/// `name => name % divisor == 0`
fn divisible_by(name: &str, divisor: i32) -> Predicate {
    let p = int(name);
    Predicate::from_body(
        p.clone(),
        Expression::eq(
            Expression::rem_expr(p.to_expr(), Expression::int32(divisor)),
            Expression::int32(0),
        ),
    )
    .unwrap()
}

fn constant(value: bool) -> Predicate {
    Predicate::from_body(int("c"), Expression::bool(value)).unwrap()
}

fn eval(predicate: &Predicate, i: i32) -> bool {
    predicate.evaluate(&Value::Int32(i)).unwrap()
}

fn apply(lambda: &Lambda, i: i32) -> Value {
    lambda.invoke(&[Value::Int32(i)]).unwrap()
}

fn record_field(value: &Value, name: &str) -> Value {
    match value {
        Value::Object(record) => record.get(name).cloned().unwrap(),
        other => panic!("expected an object, got {}", other),
    }
}

#[test]
fn test_identity_short_circuits() {
    let mut rng = rand::thread_rng();
    for _ in 0..8 {
        let p = greater_than("x", rng.gen_range(-100..100));

        assert!(PredicateBuilder::and(&p, &constant(true)).unwrap().ptr_eq(&p));
        assert!(PredicateBuilder::and(&constant(true), &p).unwrap().ptr_eq(&p));
        assert!(PredicateBuilder::or(&p, &constant(false)).unwrap().ptr_eq(&p));
        assert!(PredicateBuilder::or(&constant(false), &p).unwrap().ptr_eq(&p));
    }
}

#[test]
fn test_and_with_false_is_fresh_and_false() {
    let mut rng = rand::thread_rng();
    let p = greater_than("x", 0);
    let f = constant(false);
    let result = PredicateBuilder::and(&p, &f).unwrap();

    assert!(!result.ptr_eq(&p));
    assert!(!result.ptr_eq(&f));
    for i in random_inputs(&mut rng) {
        assert!(!eval(&result, i));
    }
}

/// `name => 100 / name > bound`, which fails on zero
fn quotient_above(name: &str, bound: i32) -> Predicate {
    let p = int(name);
    Predicate::from_body(
        p.clone(),
        Expression::gt(
            Expression::div_expr(Expression::int32(100), p.to_expr()),
            Expression::int32(bound),
        ),
    )
    .unwrap()
}

/// Random integers plus NULL and zero
fn edge_inputs(rng: &mut ThreadRng) -> Vec<Value> {
    let mut inputs: Vec<Value> = random_inputs(rng).into_iter().map(Value::Int32).collect();
    inputs.extend([Value::Null, Value::Int32(0)]);
    inputs
}

#[test]
fn test_and_or_not_match_boolean_logic() {
    let mut rng = rand::thread_rng();
    let operands = [
        greater_than("x", rng.gen_range(-50..50)),
        divisible_by("y", rng.gen_range(2..7)),
        quotient_above("z", rng.gen_range(-5..5)),
    ];

    for p in &operands {
        for q in &operands {
            let and = PredicateBuilder::and(p, q).unwrap();
            let or = PredicateBuilder::or(p, q).unwrap();
            let not = PredicateBuilder::not(p);

            for input in edge_inputs(&mut rng) {
                let expected_and = p
                    .evaluate(&input)
                    .and_then(|a| if a { q.evaluate(&input) } else { Ok(false) });
                let expected_or = p
                    .evaluate(&input)
                    .and_then(|a| if a { Ok(true) } else { q.evaluate(&input) });

                assert_eq!(and.evaluate(&input), expected_and, "{} on {}", and, input);
                assert_eq!(or.evaluate(&input), expected_or, "{} on {}", or, input);
                assert_eq!(
                    not.evaluate(&input),
                    p.evaluate(&input).map(|b| !b),
                    "{} on {}",
                    not,
                    input
                );
            }
        }
    }
}

#[test]
fn test_all_and_any() {
    let mut rng = rand::thread_rng();
    assert!(PredicateBuilder::all(DataType::Int32, vec![]).unwrap().is_constant(true));
    assert!(PredicateBuilder::any(DataType::Int32, vec![]).unwrap().is_constant(false));

    let ps = vec![
        greater_than("a", rng.gen_range(-500..0)),
        divisible_by("b", 2),
        PredicateBuilder::not(&greater_than("c", rng.gen_range(0..500))),
    ];
    let all = PredicateBuilder::all(DataType::Int32, ps.clone()).unwrap();
    let any = PredicateBuilder::any(DataType::Int32, ps.clone()).unwrap();

    for i in random_inputs(&mut rng) {
        assert_eq!(eval(&all, i), ps.iter().all(|p| eval(p, i)));
        assert_eq!(eval(&any, i), ps.iter().any(|p| eval(p, i)));
    }
}

#[test]
fn test_combine_matches_pointwise_application() {
    let mut rng = rand::thread_rng();
    let k = rng.gen_range(1..10);
    let combiner = Lambda::new(
        vec![int("x"), int("y")],
        Expression::sub_expr(int("x").to_expr(), int("y").to_expr()),
    )
    .unwrap();

    for (first_name, second_name) in [("x", "y"), ("x", "x"), ("y", "x")] {
        let f = Lambda::unary(
            int(first_name),
            Expression::mul_expr(int(first_name).to_expr(), Expression::int32(k)),
        )
        .unwrap();
        let g = Lambda::unary(
            int(second_name),
            Expression::add_expr(int(second_name).to_expr(), Expression::int32(k)),
        )
        .unwrap();
        let combined = combine(&f, &g, &combiner).unwrap();

        for i in random_inputs(&mut rng) {
            let expected = combiner
                .invoke(&[apply(&f, i), apply(&g, i)])
                .unwrap();
            assert_eq!(apply(&combined, i), expected);
        }
    }
}

#[test]
fn test_compose_matches_nested_application() {
    let mut rng = rand::thread_rng();
    let f = Lambda::unary(
        int("x"),
        Expression::add_expr(int("x").to_expr(), Expression::int32(rng.gen_range(-9..9))),
    )
    .unwrap();
    let g = Lambda::unary(
        int("x"),
        Expression::mul_expr(int("x").to_expr(), int("x").to_expr()),
    )
    .unwrap();
    let composed = compose(&f, &g).unwrap();

    for i in random_inputs(&mut rng) {
        let inner = apply(&f, i);
        assert_eq!(apply(&composed, i), g.invoke(&[inner]).unwrap());
    }
}

#[test]
fn test_coalesce_values() {
    let mut rng = rand::thread_rng();

    // x => x > 0 ? x : null
    let x = int("x");
    let partial = Lambda::unary(
        x.clone(),
        Expression::conditional(
            Expression::gt(x.to_expr(), Expression::int32(0)),
            x.to_expr(),
            Expression::null(),
        ),
    )
    .unwrap();
    let default = rng.gen_range(1000..2000);
    let with_zero = coalesce(&partial, None).unwrap();
    let with_default = coalesce(&partial, Some(Value::Int32(default))).unwrap();

    for i in random_inputs(&mut rng) {
        match apply(&partial, i) {
            Value::Null => {
                assert_eq!(apply(&with_zero, i), Value::Int32(0));
                assert_eq!(apply(&with_default, i), Value::Int32(default));
            }
            present => {
                assert_eq!(apply(&with_zero, i), present);
                assert_eq!(apply(&with_default, i), present);
            }
        }
    }
}

#[test]
fn test_projection_with_name() {
    let mut rng = rand::thread_rng();
    let foo = Arc::new(
        ObjectType::new("Foo")
            .with_field("Id", DataType::Int32)
            .with_field("Name", DataType::Varchar),
    );

    let i = int("i");
    let base = Lambda::unary(
        i.clone(),
        Expression::member_init(
            foo.clone(),
            vec![Binding::new(foo.field_ref("Id").unwrap(), i.to_expr())],
        )
        .unwrap(),
    )
    .unwrap();
    let d = Parameter::new("d", foo.data_type());
    let name_getter = Lambda::unary(d.clone(), foo.member(d.to_expr(), "Name").unwrap()).unwrap();
    let bob = Lambda::unary(int("_"), Expression::string("bob")).unwrap();

    let projection: Lambda = Projection::create(base)
        .unwrap()
        .with(&name_getter, &bob)
        .unwrap()
        .into();

    for i in random_inputs(&mut rng) {
        let result = apply(&projection, i);
        assert_eq!(record_field(&result, "Id"), Value::Int32(i));
        assert_eq!(record_field(&result, "Name"), Value::from("bob"));
    }
}

#[test]
fn test_projection_shape_errors() {
    let foo = Arc::new(ObjectType::new("Foo").with_field("Id", DataType::Int32));

    let existing = Lambda::returning(vec![int("i")], Expression::null(), foo.data_type()).unwrap();
    assert!(matches!(
        Projection::create(existing),
        Err(ExpressionError::InvalidExpressionShape { .. })
    ));

    // d => d.Id + 1 is not a plain field access
    let d = Parameter::new("d", foo.data_type());
    let computed = Lambda::unary(
        d.clone(),
        Expression::add_expr(foo.member(d.to_expr(), "Id").unwrap(), Expression::int32(1)),
    )
    .unwrap();
    let builder = Projection::create_default(DataType::Int32, &foo).unwrap();
    let value = Lambda::unary(int("i"), int("i").to_expr()).unwrap();
    assert!(matches!(
        builder.with(&computed, &value),
        Err(ExpressionError::InvalidArgument { .. })
    ));
}

#[test]
fn test_compiled_functions_across_threads() {
    let mut rng = rand::thread_rng();
    let predicate = PredicateBuilder::and(&greater_than("x", 0), &divisible_by("y", 3)).unwrap();
    let accepts = Arc::new(predicate.compile());
    let inputs = Arc::new(random_inputs(&mut rng));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let accepts = Arc::clone(&accepts);
            let inputs = Arc::clone(&inputs);
            thread::spawn(move || {
                inputs
                    .iter()
                    .filter(|&&i| accepts(&Value::Int32(i)))
                    .count()
            })
        })
        .collect();

    let expected = inputs.iter().filter(|&&i| i > 0 && i % 3 == 0).count();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_stored_predicate_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p.lmbd");
    let predicate = PredicateBuilder::or(&greater_than("x", 10), &divisible_by("y", 5)).unwrap();

    codec::save_binary(predicate.as_lambda(), &path).unwrap();
    let restored = Predicate::new(codec::load(&path).unwrap()).unwrap();

    assert_eq!(restored, predicate);
    for i in [-10, -3, 0, 7, 11, 25] {
        assert_eq!(eval(&restored, i), eval(&predicate, i));
    }
}
