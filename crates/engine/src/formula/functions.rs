/// Documentation entry for one built-in function, surfaced by the formula
/// bar tooltip while the user types.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDoc {
    pub name: &'static str,
    pub syntax: &'static str,
    pub description: &'static str,
}

/// Every function the evaluator accepts. Names outside this table evaluate
/// to #NAME?.
pub const FUNCTIONS: &[FunctionDoc] = &[
    FunctionDoc {
        name: "SUM",
        syntax: "SUM(range, ...)",
        description: "Adds the numeric values in the arguments",
    },
    FunctionDoc {
        name: "AVERAGE",
        syntax: "AVERAGE(range, ...)",
        description: "Arithmetic mean of the numeric values in the arguments",
    },
    FunctionDoc {
        name: "MIN",
        syntax: "MIN(range, ...)",
        description: "Smallest numeric value in the arguments",
    },
    FunctionDoc {
        name: "MAX",
        syntax: "MAX(range, ...)",
        description: "Largest numeric value in the arguments",
    },
    FunctionDoc {
        name: "COUNT",
        syntax: "COUNT(range, ...)",
        description: "Counts non-empty cells in the arguments",
    },
    FunctionDoc {
        name: "ROUND",
        syntax: "ROUND(value, digits)",
        description: "Rounds a number to the given number of decimal digits",
    },
    FunctionDoc {
        name: "IF",
        syntax: "IF(condition, then, else)",
        description: "Returns the second argument when the condition holds, otherwise the third",
    },
    FunctionDoc {
        name: "AND",
        syntax: "AND(cond1, cond2, ...)",
        description: "1 when every condition holds, otherwise 0",
    },
    FunctionDoc {
        name: "OR",
        syntax: "OR(cond1, cond2, ...)",
        description: "1 when any condition holds, otherwise 0",
    },
    FunctionDoc {
        name: "NOT",
        syntax: "NOT(condition)",
        description: "Inverts a condition: 1 becomes 0 and 0 becomes 1",
    },
    FunctionDoc {
        name: "VLOOKUP",
        syntax: "VLOOKUP(key, range, col_index)",
        description: "Finds the key in the first column of the range and returns the cell col_index columns in",
    },
    FunctionDoc {
        name: "COUNTIF",
        syntax: "COUNTIF(range, criteria)",
        description: "Counts cells in the range matching the criteria",
    },
    FunctionDoc {
        name: "SUMIF",
        syntax: "SUMIF(range, criteria, [sum_range])",
        description: "Sums cells where the corresponding range cell matches the criteria",
    },
    FunctionDoc {
        name: "TRIM",
        syntax: "TRIM(text)",
        description: "Removes leading and trailing whitespace from text",
    },
    FunctionDoc {
        name: "CONCATENATE",
        syntax: "CONCATENATE(value, ...)",
        description: "Joins the arguments into one text value",
    },
    FunctionDoc {
        name: "LEFT",
        syntax: "LEFT(text, [count])",
        description: "First count characters of the text (default 1)",
    },
    FunctionDoc {
        name: "RIGHT",
        syntax: "RIGHT(text, [count])",
        description: "Last count characters of the text (default 1)",
    },
    FunctionDoc {
        name: "LEN",
        syntax: "LEN(text)",
        description: "Number of characters in the text",
    },
    FunctionDoc {
        name: "SPARKLINE",
        syntax: "SPARKLINE(range)",
        description: "Renders an inline line chart of the range",
    },
    FunctionDoc {
        name: "BARCHART",
        syntax: "BARCHART(range)",
        description: "Renders an inline bar chart of the range",
    },
    FunctionDoc {
        name: "PIECHART",
        syntax: "PIECHART(range)",
        description: "Renders an inline pie chart of the range",
    },
];

/// Case-insensitive lookup into the function table.
pub fn function_doc(name: &str) -> Option<&'static FunctionDoc> {
    FUNCTIONS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

/// Whether `name` is a recognized function name.
pub fn is_function_name(name: &str) -> bool {
    function_doc(name).is_some()
}
