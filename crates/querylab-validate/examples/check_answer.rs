use std::env;
use std::path::PathBuf;

use querylab_validate::{AnswerValidator, QuestionPaths, SqliteStore, load_sql, render_report};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut question_dir: Option<PathBuf> = None;
    let mut answer_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--question" => question_dir = args.next().map(PathBuf::from),
            "--answer" => answer_path = args.next().map(PathBuf::from),
            "--db" => db_path = args.next().map(PathBuf::from),
            _ => {
                if question_dir.is_none() {
                    question_dir = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let question = QuestionPaths::new(question_dir.ok_or("missing --question directory")?);
    let db_path = db_path.ok_or("missing --db path")?;
    let answer_path = answer_path.unwrap_or_else(|| question.solution_sql());

    let sql = load_sql(&answer_path)?;
    let validator = AnswerValidator::new(SqliteStore::new(db_path));
    let verdict = validator.check(&question, &sql).await?;

    println!("{}", render_report(&verdict, 20));
    Ok(())
}
