//! Canonical output of the printer and its stability under re-parsing.

mod common;

use common::{assert_idempotent, parse_ok};
use jindo_syntax::format;

// -----------------------------------------------------------
// Canonical form.
// -----------------------------------------------------------

#[test]
fn canonical_file() {
    let src = "module m
import \"fmt\"
type (
  T int
  U = []T
)
var x int = 1
func add(a int, b int) int {
  if a < b { return b }
  return a + b
}
oper (a T) radd (b int) T { return a }
";
    let expected = "module m

import \"fmt\"

type (
\tT int
\tU = []T
)

var x int = 1

func add(a int, b int) int {
\tif b > a {
\t\treturn b
\t}
\treturn a + b
}

oper (a T) radd (b int) T {
\treturn a
}
";
    assert_eq!(format(&parse_ok(src)), expected);
}

#[test]
fn mirrored_comparison() {
    assert_eq!(
        format(&parse_ok("module m\nvar r = a < b + c\n")),
        "module m\n\nvar r = b + c > a\n"
    );
}

#[test]
fn comments_are_dropped() {
    let src = "module m // header\n/* before */\nvar a = 1 // trailing\n";
    assert_eq!(format(&parse_ok(src)), "module m\n\nvar a = 1\n");
}

#[test]
fn statement_forms() {
    let src = "module m
func f() {
for {
}
for ok {
}
for i := 0; 10 > i; i++ {
x += i
}
for ; ; i-- {
}
while n > 0 {
n /= 2
}
if v := g(); v {
} else if w {
break
} else {
return
}
var t []int = []int{1, 2}
{
;
}
}
";
    let expected = "module m

func f() {
\tfor {
\t}
\tfor ok {
\t}
\tfor i := 0; 10 > i; i++ {
\t\tx += i
\t}
\tfor ;; i-- {
\t}
\twhile n > 0 {
\t\tn /= 2
\t}
\tif v := g(); v {
\t} else if w {
\t\tbreak
\t} else {
\t\treturn
\t}
\tvar t []int = []int{1, 2}
\t{
\t\t;
\t}
}
";
    assert_eq!(format(&parse_ok(src)), expected);
}

#[test]
fn grouped_declaration_in_function() {
    let src = "module m\nfunc f() {\n\tvar (\n\t\ta = 1\n\t\tb int\n\t)\n}\n";
    assert_eq!(
        format(&parse_ok(src)),
        "module m\n\nfunc f() {\n\tvar (\n\t\ta = 1\n\t\tb int\n\t)\n}\n"
    );
}

// -----------------------------------------------------------
// Idempotency.
// -----------------------------------------------------------

#[test]
fn idempotent_on_mixed_input() {
    let src = "module m
import (
\"a\"
\"b\"
)
type V = [][]int
var (
x = -(-y)
z = - -y
)
func f(p []V, q int) V {
r := p[q].w(a < b == c, !d, *e)
r.s = (r.s - 1) - (2 - 3)
return r
}
oper (l V) mul (k int) V { return l }
";
    let out = assert_idempotent(src);
    assert!(out.contains("b > a == c"), "{out}");
    assert!(out.contains("- -y"), "{out}");
}

#[test]
fn idempotent_on_operator_mixes() {
    for expr in [
        "a - (b - c)",
        "a < b < c",
        "a == b < c",
        "a || b && c | d ^ e &^ f << g",
        "(a + b) * -c % d",
        "x[i + 1](y)[z].w",
        "[]int{a + 1, -b}",
    ] {
        assert_idempotent(&format!("module m\nvar v = {expr}\n"));
    }
}
