//! benches.rs
use criterion::{criterion_group, criterion_main, Criterion};
use num_complex::Complex;
use paste::paste;
use symcalc::{differentiate, execute, parse, simplify, to_latex, to_string, ExpressionParameters};

fn params_with(values: &[(&str, f64)]) -> ExpressionParameters {
    let mut params = ExpressionParameters::new();
    for (name, value) in values {
        params.parameters.set(name, *value).unwrap();
    }
    params
}

fn bench_analyze_liner(c: &mut Criterion) {
    let make_much_operand = |n: usize| (0..=n).map(|_| "x").collect::<Vec<_>>().join("+");
    for n in [1, 10, 100, 1000] {
        let formula = make_much_operand(n);
        c.bench_function(&format!("parse {} operands", n), |b| {
            b.iter(|| { let _ = parse(&formula); })
        });

        let expr = parse(&formula).unwrap();
        let mut params = params_with(&[("x", 1.0)]);
        c.bench_function(&format!("exec {} operands", n), |b| {
            b.iter(|| execute(&expr, &mut params))
        });
    }
}

fn bench_analyze_nested(c: &mut Criterion) {
    let make_much_nested = |n: usize| {
        let mut formula = "x".to_string();
        for _ in 0..n {
            formula = format!("sin({})", formula);
        }
        formula
    };
    for n in [1, 10, 100] {
        let formula = make_much_nested(n);
        c.bench_function(&format!("parse {} nested", n), |b| {
            b.iter(|| { let _ = parse(&formula); })
        });

        let expr = parse(&formula).unwrap();
        let mut params = params_with(&[("x", 1.0)]);
        c.bench_function(&format!("exec {} nested", n), |b| {
            b.iter(|| execute(&expr, &mut params))
        });
    }
}

fn bench_analyze_literal(c: &mut Criterion) {
    let make_much_order = |n: usize| {
        let digits = "123456789";
        digits.repeat((n + 8) / 9)[..n].to_string()
    };
    for n in [1, 10, 100] {
        let formula = make_much_order(n);
        c.bench_function(&format!("parse {} order literal", n), |b| {
            b.iter(|| { let _ = parse(&formula); })
        });
    }
    for formula in ["0xFF00FF", "0b1011011101111", "0755"] {
        c.bench_function(&format!("parse radix literal '{}'", formula), |b| {
            b.iter(|| { let _ = parse(formula); })
        });
    }
}

fn bench_analyze_paren(c: &mut Criterion) {
    let values = ('a'..='f').map(|key| (key.to_string(), 1.0f64)).collect::<Vec<(String, f64)>>();
    let values = values.iter().map(|(k, v)| (k.as_str(), *v)).collect::<Vec<_>>();

    for formula in ["(a+b)*(c-d)/(e+f)", "a+b*c-d/e+f"] {
        c.bench_function(&format!("parse '{}'", formula), |b| {
            b.iter(|| { let _ = parse(formula); })
        });

        let expr = parse(formula).unwrap();
        let mut params = params_with(&values);
        c.bench_function(&format!("exec '{}'", formula), |b| {
            b.iter(|| execute(&expr, &mut params))
        });

        c.bench_function(&format!("to_string '{}'", formula), |b| {
            b.iter(|| to_string(&expr))
        });
        c.bench_function(&format!("to_latex '{}'", formula), |b| {
            b.iter(|| to_latex(&expr))
        });
    }
}

fn bench_analyze_many_vars(c: &mut Criterion) {
    let names: Vec<String> = (1..=100).map(|i| format!("a{}", i)).collect();
    let values: Vec<(&str, f64)> = names.iter().map(|name| (name.as_str(), 1.0)).collect();

    // a1 + a2 + ... + a100
    let formula = names.join(" + ");

    c.bench_function("parse many vars (100)", |b| {
        b.iter(|| { let _ = parse(&formula); })
    });

    let expr = parse(&formula).unwrap();
    let mut params = params_with(&values);
    c.bench_function("exec many vars (100)", |b| {
        b.iter(|| execute(&expr, &mut params))
    });
}

fn bench_analyze_diff(c: &mut Criterion) {
    let formulas = [
        "x^2",
        "sin(x)",
        "exp(x^2+3*x+1)",
        "sin(cos(x))",
        "x^10 + x^5 + x^2",
    ];

    for formula in &formulas {
        let expr = parse(formula).unwrap();
        c.bench_function(&format!("differentiate '{}'", formula), |b| {
            b.iter(|| differentiate(&expr, "x"))
        });

        let derivative = differentiate(&expr, "x").unwrap();
        c.bench_function(&format!("simplify derivative of '{}'", formula), |b| {
            b.iter(|| simplify(&derivative))
        });

        let expr = parse(&format!("deriv({}, x, 0.7)", formula)).unwrap();
        let mut params = ExpressionParameters::new();
        c.bench_function(&format!("exec deriv '{}'", formula), |b| {
            b.iter(|| execute(&expr, &mut params))
        });
    }
}

fn bench_analyze_invalid(c: &mut Criterion) {
    let invalid_formulas = [
        "1 + (2 * 3",           // forget ')'
        "x ** 2",               // missing operand for '*'
        "1 + @",                // unknown character '@'
        "0b102",                // malformed binary literal
    ];

    for formula in &invalid_formulas {
        c.bench_function(&format!("parse invalid: {}", formula), |b| {
            b.iter(|| { let _ = parse(formula); })
        });
    }
}

criterion_group!(bench_analyze,
    bench_analyze_liner,
    bench_analyze_nested,
    bench_analyze_literal,
    bench_analyze_paren,
    bench_analyze_many_vars,
    bench_analyze_diff,
    bench_analyze_invalid,
);

fn bench_practical_polynomial(c: &mut Criterion) {
    let values = [("a0", 1.0), ("a1", -2.0), ("a2", 5.25), ("a3", -0.03), ("a4", 1.0), ("x", 2.4)];

    let formula = "a0 + a1*x + a2*x^2 + a3*x^3 + a4*x^4";
    c.bench_function(&format!("parse polynomial '{}'", formula), |b| {
        b.iter(|| { let _ = parse(formula); })
    });

    let expr = parse(formula).unwrap();
    let mut params = params_with(&values);
    c.bench_function(&format!("exec polynomial '{}'", formula), |b| {
        b.iter(|| execute(&expr, &mut params))
    });
}

fn bench_practical_wave_function(c: &mut Criterion) {
    let values = [("w", 0.25), ("phy", -2.0), ("A", 5.25), ("B", -0.03), ("t", 0.3)];

    let formula = "A*sin(w*t + phy) + B*cos(w*t + phy)";
    c.bench_function(&format!("parse wave function '{}'", formula), |b| {
        b.iter(|| { let _ = parse(formula); })
    });

    let expr = parse(formula).unwrap();
    let mut params = params_with(&values);
    c.bench_function(&format!("exec wave function '{}'", formula), |b| {
        b.iter(|| execute(&expr, &mut params))
    });
}

fn bench_practical_user_function(c: &mut Criterion) {
    let mut params = ExpressionParameters::new();
    let definition = parse("fib(n) := if(n < 2, n, fib(n - 1) + fib(n - 2))").unwrap();
    execute(&definition, &mut params).unwrap();

    let expr = parse("fib(15)").unwrap();
    c.bench_function("exec recursive user function 'fib(15)'", |b| {
        b.iter(|| execute(&expr, &mut params))
    });
}

fn bench_practical_loop(c: &mut Criterion) {
    let expr = parse("for(s += k ^ 2, k := 1, k <= 1000, k++)").unwrap();
    let mut params = params_with(&[("s", 0.0)]);
    c.bench_function("exec for loop (1000 iterations)", |b| {
        b.iter(|| execute(&expr, &mut params))
    });
}

criterion_group!(bench_practical,
    bench_practical_polynomial,
    bench_practical_wave_function,
    bench_practical_user_function,
    bench_practical_loop,
);

macro_rules! compares_one_arity_functions {
    ($( $variant: ident ),* $(,)? ) => {
        paste! {
            $(
                pub fn [<bench_compares_ $variant>](c: &mut Criterion) {
                    let x = 0.5f64;

                    c.bench_function(concat!("direct ", stringify!($variant), "(x)"), |b| {
                        b.iter(|| x.$variant())
                    });

                    let expr = parse(concat!(stringify!($variant), "(x)")).unwrap();
                    let mut params = params_with(&[("x", x)]);
                    c.bench_function(concat!("parsed \"", stringify!($variant), "(x)\""), |b| {
                        b.iter(|| execute(&expr, &mut params))
                    });
                }
            )*
        }
    };
}

compares_one_arity_functions! {
    sin,    cos,    tan,
    sinh,   cosh,   tanh,
    exp,    ln,     sqrt,
    abs,    floor,  ceil,
}

pub fn bench_compares_complex_pow(c: &mut Criterion) {
    let x = Complex::new(1.0, 0.5);
    let y = Complex::new(2.0, -0.5);

    c.bench_function("direct x.powc(y)", |b| {
        b.iter(|| x.powc(y))
    });

    let expr = parse("x ^ y").unwrap();
    let mut params = ExpressionParameters::new();
    params.parameters.set("x", x).unwrap();
    params.parameters.set("y", y).unwrap();
    c.bench_function(r#"parsed "x ^ y" (complex)"#, |b| {
        b.iter(|| execute(&expr, &mut params))
    });
}

criterion_group!(bench_compare,
    bench_compares_sin,     bench_compares_cos,     bench_compares_tan,
    bench_compares_sinh,    bench_compares_cosh,    bench_compares_tanh,
    bench_compares_exp,     bench_compares_ln,      bench_compares_sqrt,
    bench_compares_abs,     bench_compares_floor,   bench_compares_ceil,

    bench_compares_complex_pow,
);

criterion_main!{
    bench_analyze,
    bench_practical,
    bench_compare,
}
