use std::collections::HashSet;
use std::collections::HashMap;
use super::eir::*;

/// Functions reachable from one function definition
#[derive(PartialEq, Debug, Clone)]
pub struct FunctionUsage {
    /// Functions called directly from the body
    pub calls: HashSet<FunctionId>,
    /// Every function reachable through any chain of calls
    pub functions: HashSet<FunctionId>,
}

/// The static call graph of a module
#[derive(PartialEq, Debug, Clone)]
pub struct GlobalUsage {
    pub functions: HashMap<FunctionId, FunctionUsage>,
}

impl GlobalUsage {
    pub fn analyse(root_definitions: &[RootDefinition]) -> GlobalUsage {
        let mut direct = HashMap::new();
        for root in root_definitions {
            if let RootDefinition::Function(ref func) = *root {
                let mut calls = HashSet::new();
                for statement in &func.body {
                    search_statement(statement, &mut calls);
                }
                direct.insert(func.id, calls);
            }
        }

        // Expand reachable sets until nothing changes
        let mut prev = direct.clone();
        loop {
            let mut next = prev.clone();
            for reachable in next.values_mut() {
                let mut added = HashSet::new();
                for id in reachable.iter() {
                    if let Some(other) = prev.get(id) {
                        added.extend(other.iter().cloned());
                    }
                }
                reachable.extend(added);
            }
            if prev != next {
                prev = next;
            } else {
                break;
            }
        }

        let mut usage = GlobalUsage { functions: HashMap::new() };
        for (id, calls) in direct {
            let functions = prev.remove(&id).unwrap_or_default();
            usage.functions.insert(id, FunctionUsage { calls, functions });
        }
        usage
    }

    /// Functions that can reach themselves through calls, in id order
    pub fn find_recursion(&self) -> Vec<FunctionId> {
        let mut recursive = self.functions
            .iter()
            .filter(|&(id, usage)| usage.functions.contains(id))
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        recursive.sort();
        recursive
    }

    /// Length of the longest call chain starting at a function, counting the
    /// function itself. Recursive chains are cut when they revisit a function.
    pub fn get_call_depth(&self, id: FunctionId) -> u32 {
        let mut memo = HashMap::new();
        let mut visiting = HashSet::new();
        self.call_depth(id, &mut memo, &mut visiting)
    }

    fn call_depth(&self,
                  id: FunctionId,
                  memo: &mut HashMap<FunctionId, u32>,
                  visiting: &mut HashSet<FunctionId>)
                  -> u32 {
        if let Some(depth) = memo.get(&id) {
            return *depth;
        }
        if !visiting.insert(id) {
            return 0;
        }
        let mut deepest = 0;
        if let Some(usage) = self.functions.get(&id) {
            for callee in &usage.calls {
                deepest = deepest.max(self.call_depth(*callee, memo, visiting));
            }
        }
        visiting.remove(&id);
        memo.insert(id, deepest + 1);
        deepest + 1
    }
}

fn search_statement(statement: &Statement, calls: &mut HashSet<FunctionId>) {
    match *statement {
        Statement::Expression(ref expr) => search_expression(expr, calls),
        Statement::Var(ref defs) => {
            for def in defs {
                search_vardef(def, calls);
            }
        }
        Statement::Block(ref statements) => {
            for statement in statements {
                search_statement(statement, calls);
            }
        }
        Statement::If(ref cond, ref then_branch, ref else_branch) => {
            search_expression(cond, calls);
            search_statement(then_branch, calls);
            if let Some(ref else_branch) = *else_branch {
                search_statement(else_branch, calls);
            }
        }
        Statement::For(ref for_loop) => {
            search_vardef(&for_loop.init, calls);
            search_expression(&for_loop.condition, calls);
            search_expression(&for_loop.iteration, calls);
            search_statement(&for_loop.body, calls);
        }
        Statement::While(ref cond, ref body) => {
            match *cond {
                Condition::Expr(ref expr) => search_expression(expr, calls),
                Condition::Assignment(ref def) => search_vardef(def, calls),
            }
            search_statement(body, calls);
        }
        Statement::DoWhile(ref body, ref cond) => {
            search_statement(body, calls);
            search_expression(cond, calls);
        }
        Statement::Return(Some(ref expr)) => search_expression(expr, calls),
        Statement::Return(None) |
        Statement::Break |
        Statement::Continue |
        Statement::Discard => {}
    }
}

fn search_vardef(def: &VarDef, calls: &mut HashSet<FunctionId>) {
    if let Some(ref expr) = def.init {
        search_expression(expr, calls);
    }
}

fn search_expression(expression: &Expression, calls: &mut HashSet<FunctionId>) {
    match *expression {
        Expression::Literal(_) | Expression::Variable(_) | Expression::Builtin(_) => {}
        Expression::UnaryOperation(_, ref expr) |
        Expression::Swizzle(ref expr, _) |
        Expression::Member(ref expr, _) => search_expression(expr, calls),
        Expression::BinaryOperation(_, ref lhs, ref rhs) |
        Expression::Assignment(_, ref lhs, ref rhs) |
        Expression::ArraySubscript(ref lhs, ref rhs) => {
            search_expression(lhs, calls);
            search_expression(rhs, calls);
        }
        Expression::TernaryConditional(ref cond, ref left, ref right) => {
            search_expression(cond, calls);
            search_expression(left, calls);
            search_expression(right, calls);
        }
        Expression::Call(ref id, ref exprs) => {
            calls.insert(*id);
            for expr in exprs {
                search_expression(expr, calls);
            }
        }
        Expression::Sequence(ref exprs) |
        Expression::Intrinsic(_, ref exprs, _) |
        Expression::Constructor(_, ref exprs) |
        Expression::StructConstructor(_, ref exprs) => {
            for expr in exprs {
                search_expression(expr, calls);
            }
        }
    }
}

#[cfg(test)]
fn call_function(id: u32, body: Vec<u32>) -> RootDefinition {
    RootDefinition::Function(FunctionDefinition {
        id: FunctionId(id),
        params: vec![],
        body: body.into_iter()
            .map(|callee| Statement::Expression(Expression::Call(FunctionId(callee), vec![])))
            .collect(),
    })
}

#[test]
fn test_call_depth() {
    let roots = vec![call_function(0, vec![]), call_function(1, vec![0]), call_function(2, vec![1, 0])];
    let usage = GlobalUsage::analyse(&roots);
    assert!(usage.find_recursion().is_empty());
    assert_eq!(usage.get_call_depth(FunctionId(2)), 3);
    assert_eq!(usage.get_call_depth(FunctionId(0)), 1);
    assert!(usage.functions[&FunctionId(2)].functions.contains(&FunctionId(0)));
    assert!(!usage.functions[&FunctionId(2)].calls.contains(&FunctionId(2)));
}

#[test]
fn test_recursion() {
    let roots = vec![call_function(0, vec![1]), call_function(1, vec![0]), call_function(2, vec![0])];
    let usage = GlobalUsage::analyse(&roots);
    assert_eq!(usage.find_recursion(), vec![FunctionId(0), FunctionId(1)]);
}
